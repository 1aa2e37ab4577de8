use crate::domain::{EmailMessage, SubscriberEmail};
use crate::error_chain_fmt;
use crate::guards::AuthenticatedCaller;
use crate::service::{ExactTargetService, ServiceError};
use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use rocket::{Request, Response, State};

#[derive(serde::Deserialize)]
pub struct SendEmailBody {
    recipients: Vec<String>,
    message: Option<EmailMessage>,
    email_id: Option<String>,
    email_xml_context: Option<String>,
    #[serde(default = "fail_silently_by_default")]
    fail_silently: bool,
}

fn fail_silently_by_default() -> bool {
    true
}

#[derive(serde::Serialize)]
pub struct SendEmailOutcome {
    sent: bool,
}

#[tracing::instrument(
    name = "Sending an email on behalf of a caller",
    skip(body, service, caller),
    fields(
        caller = %caller.username,
        recipients = body.recipients.len()
    )
)]
#[post("/emails", data = "<body>")]
pub async fn send_email(
    body: Json<SendEmailBody>,
    service: &State<ExactTargetService>,
    caller: AuthenticatedCaller,
) -> Result<Json<SendEmailOutcome>, SendEmailError> {
    let body = body.into_inner();
    let recipients = body
        .recipients
        .into_iter()
        .map(SubscriberEmail::parse)
        .collect::<Result<Vec<_>, _>>()
        .map_err(SendEmailError::ValidationError)?;

    let sent = service
        .send_email(
            &recipients,
            body.message.as_ref(),
            body.email_id.as_deref(),
            body.email_xml_context.as_deref(),
            body.fail_silently,
        )
        .await?;
    Ok(Json(SendEmailOutcome { sent }))
}

#[derive(thiserror::Error)]
pub enum SendEmailError {
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    ServiceError(#[from] ServiceError),
}

impl std::fmt::Debug for SendEmailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl<'r> Responder<'r, 'static> for SendEmailError {
    fn respond_to(self, _request: &'r Request<'_>) -> rocket::response::Result<'static> {
        tracing::warn!("SendEmailError: {:?}", self);
        Response::build()
            .status(match self {
                SendEmailError::ValidationError(_) => Status::BadRequest,
                SendEmailError::ServiceError(ServiceError::MissingArgument(_)) => {
                    Status::BadRequest
                }
                SendEmailError::ServiceError(_) => Status::InternalServerError,
            })
            .ok()
    }
}
