//! Seam between the service and the ExactTarget (Fuel) object model.
//!
//! The platform exposes its records as typed objects that can be retrieved,
//! created, patched and, for triggered sends, dispatched. Every call answers
//! with a [`FuelResponse`]; a non-200 code is data, not an error.

mod error;
mod http_client;

pub use error::FuelError;
pub use http_client::{FuelClient, HttpClientFactory};

use async_trait::async_trait;
use secrecy::Secret;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Subscriber,
    Email,
    TriggeredSend,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Subscriber => "Subscriber",
            ObjectType::Email => "Email",
            ObjectType::TriggeredSend => "TriggeredSendDefinition",
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SimpleOperator {
    Equals,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchFilter {
    pub property: String,
    pub simple_operator: SimpleOperator,
    pub value: String,
}

impl SearchFilter {
    pub fn equals(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            simple_operator: SimpleOperator::Equals,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FuelResponse {
    pub code: u16,
    pub results: Vec<serde_json::Value>,
}

impl FuelResponse {
    pub fn is_ok(&self) -> bool {
        self.code == 200
    }
}

/// Reference to a subscriber as attached to a triggered send.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubscriberRef {
    pub email_address: String,
    pub subscriber_key: String,
}

impl SubscriberRef {
    pub fn new(email: &str) -> Self {
        Self {
            email_address: email.to_string(),
            subscriber_key: email.to_string(),
        }
    }
}

/// Credentials required to open a session with the platform.
///
/// `app_signature` is only checked for presence; the token login uses the
/// client id and secret.
pub struct ClientParams {
    pub app_signature: Secret<String>,
    pub client_id: String,
    pub client_secret: Secret<String>,
}

#[async_trait]
pub trait FuelApi: Send + Sync {
    async fn get(
        &self,
        object: ObjectType,
        properties: &[&str],
        filter: &SearchFilter,
    ) -> Result<FuelResponse, FuelError>;

    async fn post(
        &self,
        object: ObjectType,
        props: serde_json::Value,
    ) -> Result<FuelResponse, FuelError>;

    async fn patch(
        &self,
        object: ObjectType,
        props: serde_json::Value,
    ) -> Result<FuelResponse, FuelError>;

    async fn send(
        &self,
        object: ObjectType,
        props: serde_json::Value,
        subscribers: &[SubscriberRef],
    ) -> Result<FuelResponse, FuelError>;
}

/// Opens a fresh, single-use client session.
pub trait ClientFactory: Send + Sync {
    fn build(&self, params: ClientParams, debug: bool) -> Result<Arc<dyn FuelApi>, FuelError>;
}
