pub const HTML_MIME_TYPE: &str = "text/html";

/// An alternative rendering of a message body, such as its HTML version.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Alternative {
    pub content: String,
    pub mime_type: String,
}

/// The content handed to the platform when no email object exists yet.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub alternatives: Option<Vec<Alternative>>,
}

impl EmailMessage {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            alternatives: None,
        }
    }

    pub fn with_alternative(
        mut self,
        content: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        self.alternatives
            .get_or_insert_with(Vec::new)
            .push(Alternative {
                content: content.into(),
                mime_type: mime_type.into(),
            });
        self
    }

    /// HTML body to publish alongside the text body.
    ///
    /// Without alternatives the text body doubles as HTML. With alternatives
    /// only the first exact `text/html` entry counts, and `None` is returned
    /// when there is no such entry.
    pub fn html_body(&self) -> Option<&str> {
        match &self.alternatives {
            Some(alternatives) => alternatives
                .iter()
                .find(|alternative| alternative.mime_type == HTML_MIME_TYPE)
                .map(|alternative| alternative.content.as_str()),
            None => Some(&self.body),
        }
    }
}

impl<S, B> From<(S, B, Option<Vec<(String, String)>>)> for EmailMessage
where
    S: Into<String>,
    B: Into<String>,
{
    fn from((subject, body, alternatives): (S, B, Option<Vec<(String, String)>>)) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            alternatives: alternatives.map(|alternatives| {
                alternatives
                    .into_iter()
                    .map(|(content, mime_type)| Alternative { content, mime_type })
                    .collect()
            }),
        }
    }
}
