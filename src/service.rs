use crate::configuration::{FuelSettings, Settings};
use crate::domain::{EmailMessage, SubscriberEmail};
use crate::error_chain_fmt;
use crate::fuel::{
    ClientFactory, ClientParams, FuelApi, FuelError, FuelResponse, HttpClientFactory, ObjectType,
    SearchFilter, SubscriberRef,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

const SUBSCRIBER_PROPERTIES: &[&str] = &["SubscriberKey", "EmailAddress", "Status"];
const ACTIVE: &str = "Active";

#[derive(thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    MissingArgument(String),
    #[error("Unexpected response from the Fuel platform: {0}")]
    UnexpectedResponse(String),
    #[error("Triggered send dispatch failed with status {code}: {message}")]
    DispatchFailed { code: u16, message: String },
    #[error("A call to the Fuel platform failed.")]
    Remote(#[from] FuelError),
}

impl std::fmt::Debug for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Sends emails through ExactTarget triggered sends.
///
/// Every operation opens its own client session from the configured
/// credentials; nothing is cached between calls and remote calls are made
/// one at a time.
pub struct ExactTargetService {
    settings: FuelSettings,
    debug: bool,
    factory: Arc<dyn ClientFactory>,
}

impl ExactTargetService {
    pub fn new(settings: FuelSettings, debug: bool, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            settings,
            debug,
            factory,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let factory = HttpClientFactory::from_settings(&settings.fuel);
        Self::new(settings.fuel.clone(), settings.debug, Arc::new(factory))
    }

    pub fn get_client(&self) -> Result<Arc<dyn FuelApi>, ServiceError> {
        let params = match (
            &self.settings.app_signature,
            &self.settings.client_id,
            &self.settings.client_secret,
        ) {
            (Some(app_signature), Some(client_id), Some(client_secret)) => ClientParams {
                app_signature: app_signature.clone(),
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            },
            _ => {
                return Err(ServiceError::Configuration(
                    "Missing FuelSDK configuration".into(),
                ))
            }
        };
        Ok(self.factory.build(params, self.debug)?)
    }

    /// Makes sure a subscriber keyed by `email` exists and is active.
    ///
    /// The returned reference is the same whether the subscriber was
    /// created, patched or left untouched.
    #[tracing::instrument(
        name = "Getting or creating a subscriber",
        skip(self, email, email_xml_context),
        fields(subscriber_email = %email)
    )]
    pub async fn get_or_create_subscriber(
        &self,
        email: &SubscriberEmail,
        email_xml_context: Option<&str>,
    ) -> Result<SubscriberRef, ServiceError> {
        let client = self.get_client()?;
        let email = email.as_ref();

        let filter = SearchFilter::equals("SubscriberKey", email);
        let response = client
            .get(ObjectType::Subscriber, SUBSCRIBER_PROPERTIES, &filter)
            .await?;

        let attributes =
            email_xml_context.map(|context| json!([{ "Name": "XML", "Value": context }]));

        if !response.is_ok() {
            tracing::warn!(
                code = response.code,
                "Subscriber lookup did not succeed, leaving the record alone"
            );
        } else if let Some(subscriber) = response.results.first() {
            let mut props = json!({ "SubscriberKey": email });
            let mut changed = false;
            if let Some(attributes) = attributes {
                props["Attributes"] = attributes;
                changed = true;
            }
            if subscriber.get("Status").and_then(Value::as_str) != Some(ACTIVE) {
                props["Status"] = json!(ACTIVE);
                changed = true;
            }
            if changed {
                let patched = client.patch(ObjectType::Subscriber, props).await?;
                log_unsuccessful("Subscriber patch", &patched);
            }
        } else {
            let mut props = json!({ "SubscriberKey": email, "EmailAddress": email });
            if let Some(attributes) = attributes {
                props["Attributes"] = attributes;
            }
            let created = client.post(ObjectType::Subscriber, props).await?;
            log_unsuccessful("Subscriber creation", &created);
        }

        Ok(SubscriberRef::new(email))
    }

    /// Publishes `message` as a new email object and returns the raw answer.
    #[tracing::instrument(name = "Creating an email object", skip(self, client, message))]
    pub async fn create_email_obj(
        &self,
        client: &dyn FuelApi,
        message: &EmailMessage,
    ) -> Result<FuelResponse, ServiceError> {
        let message_uid = Uuid::new_v4().to_string();
        let mut props = json!({
            "CustomerKey": message_uid,
            "Name": message_uid,
            "Subject": message.subject,
            "TextBody": message.body,
        });
        if let Some(html_body) = message.html_body() {
            props["HTMLBody"] = json!(html_body);
        }
        Ok(client.post(ObjectType::Email, props).await?)
    }

    /// Sends an email to `recipients` through a new triggered send.
    ///
    /// Either `email_id` names an existing email object or `message` is
    /// published first. Returns `Ok(false)` when the platform refuses the
    /// dispatch and `fail_silently` is set; errors of the intermediate calls
    /// are always returned.
    #[tracing::instrument(
        name = "Sending an email",
        skip(self, recipients, message, email_xml_context),
        fields(recipients = recipients.len())
    )]
    pub async fn send_email(
        &self,
        recipients: &[SubscriberEmail],
        message: Option<&EmailMessage>,
        email_id: Option<&str>,
        email_xml_context: Option<&str>,
        fail_silently: bool,
    ) -> Result<bool, ServiceError> {
        let email_id = email_id.filter(|id| !id.is_empty());
        if message.is_none() && email_id.is_none() {
            return Err(missing_message_or_email_id());
        }

        let send_classification_key = self
            .settings
            .send_classification_key
            .as_deref()
            .ok_or_else(|| {
                ServiceError::Configuration(
                    "Missing CLASSIFICATION_CONSUMER_KEY configuration".into(),
                )
            })?;
        let client = self.get_client()?;

        let email_id = match email_id {
            Some(email_id) => email_id.to_string(),
            None => {
                let message = message.ok_or_else(missing_message_or_email_id)?;
                let response = self.create_email_obj(client.as_ref(), message).await?;
                new_id(&response)?
            }
        };

        let send_trigger_uid = Uuid::new_v4().to_string();
        client
            .post(
                ObjectType::TriggeredSend,
                json!({
                    "CustomerKey": send_trigger_uid,
                    "Name": send_trigger_uid,
                    "SendClassification": { "CustomerKey": send_classification_key },
                    "Email": { "ID": email_id },
                }),
            )
            .await?;
        client
            .patch(
                ObjectType::TriggeredSend,
                json!({
                    "CustomerKey": send_trigger_uid,
                    "TriggeredSendStatus": ACTIVE,
                }),
            )
            .await?;

        let mut subscribers = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            subscribers.push(
                self.get_or_create_subscriber(recipient, email_xml_context)
                    .await?,
            );
        }

        let response = client
            .send(
                ObjectType::TriggeredSend,
                json!({ "CustomerKey": send_trigger_uid }),
                &subscribers,
            )
            .await?;
        if response.is_ok() {
            return Ok(true);
        }

        let message = status_message(&response);
        tracing::warn!(code = response.code, %message, "Triggered send dispatch failed");
        if fail_silently {
            Ok(false)
        } else {
            Err(ServiceError::DispatchFailed {
                code: response.code,
                message,
            })
        }
    }
}

fn missing_message_or_email_id() -> ServiceError {
    ServiceError::MissingArgument("You must give message or email key parameter".into())
}

fn new_id(response: &FuelResponse) -> Result<String, ServiceError> {
    match response.results.first().and_then(|result| result.get("NewID")) {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(ServiceError::UnexpectedResponse(format!(
            "email creation answered {} without a NewID",
            response.code
        ))),
    }
}

fn status_message(response: &FuelResponse) -> String {
    response
        .results
        .first()
        .and_then(|result| result.get("StatusMessage"))
        .and_then(Value::as_str)
        .unwrap_or("no status message")
        .to_string()
}

fn log_unsuccessful(operation: &str, response: &FuelResponse) {
    if !response.is_ok() {
        tracing::warn!(code = response.code, "{} was not accepted", operation);
    }
}
