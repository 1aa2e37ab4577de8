use super::{
    ClientFactory, ClientParams, FuelApi, FuelError, FuelResponse, ObjectType, SearchFilter,
    SubscriberRef,
};
use crate::configuration::FuelSettings;
use async_trait::async_trait;
use reqwest::{Client, Method};
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub struct HttpClientFactory {
    auth_url: String,
    base_url: String,
    timeout: Duration,
}

impl HttpClientFactory {
    pub fn new(auth_url: &str, base_url: &str, timeout: Duration) -> Self {
        Self {
            auth_url: auth_url.to_string(),
            base_url: base_url.to_string(),
            timeout,
        }
    }

    pub fn from_settings(settings: &FuelSettings) -> Self {
        Self::new(&settings.auth_url, &settings.base_url, settings.timeout())
    }
}

impl ClientFactory for HttpClientFactory {
    fn build(&self, params: ClientParams, debug: bool) -> Result<Arc<dyn FuelApi>, FuelError> {
        let client: Arc<dyn FuelApi> = Arc::new(FuelClient::new(
            &self.auth_url,
            &self.base_url,
            self.timeout,
            params,
            debug,
        )?);
        Ok(client)
    }
}

/// A single platform session.
///
/// The access token is requested on first use and kept for the lifetime of
/// the client, which is one service call.
pub struct FuelClient {
    http_client: Client,
    auth_url: String,
    base_url: String,
    client_id: String,
    client_secret: Secret<String>,
    debug: bool,
    access_token: Mutex<Option<Secret<String>>>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct RetrieveRequest<'a> {
    properties: &'a [&'a str],
    filter: &'a SearchFilter,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendRequest<'a> {
    definition: serde_json::Value,
    subscribers: &'a [SubscriberRef],
}

impl FuelClient {
    pub fn new(
        auth_url: &str,
        base_url: &str,
        timeout: Duration,
        params: ClientParams,
        debug: bool,
    ) -> Result<Self, FuelError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        let ClientParams {
            client_id,
            client_secret,
            ..
        } = params;
        Ok(Self {
            http_client,
            auth_url: auth_url.trim_end_matches('/').to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            debug,
            access_token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<Secret<String>, FuelError> {
        let mut cached = self.access_token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let response = self
            .http_client
            .post(format!("{}/v1/requestToken", self.auth_url))
            .json(&TokenRequest {
                client_id: &self.client_id,
                client_secret: self.client_secret.expose_secret(),
            })
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FuelError::Authentication(format!(
                "token endpoint answered {}: {}",
                status, body
            )));
        }
        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| FuelError::Decode(e.to_string()))?;

        let token = Secret::new(token.access_token);
        *cached = Some(token.clone());
        Ok(token)
    }

    fn object_url(&self, object: ObjectType, action: Option<&str>) -> String {
        match action {
            Some(action) => format!("{}/{}/{}", self.base_url, object.as_str(), action),
            None => format!("{}/{}", self.base_url, object.as_str()),
        }
    }

    #[tracing::instrument(name = "Calling the Fuel platform", skip(self, body))]
    async fn call<B: serde::Serialize>(
        &self,
        method: Method,
        object: ObjectType,
        action: Option<&str>,
        body: &B,
    ) -> Result<FuelResponse, FuelError> {
        let token = self.access_token().await?;
        let url = self.object_url(object, action);
        if self.debug {
            match serde_json::to_string(body) {
                Ok(payload) => tracing::debug!(%url, %payload, "Fuel request"),
                Err(e) => tracing::debug!(%url, error = %e, "Fuel request (unprintable payload)"),
            }
        }

        let response = self
            .http_client
            .request(method, &url)
            .bearer_auth(token.expose_secret())
            .json(body)
            .send()
            .await?;
        let response = decode_response(response).await?;

        if self.debug {
            tracing::debug!(code = response.code, results = ?response.results, "Fuel response");
        }
        Ok(response)
    }
}

#[async_trait]
impl FuelApi for FuelClient {
    async fn get(
        &self,
        object: ObjectType,
        properties: &[&str],
        filter: &SearchFilter,
    ) -> Result<FuelResponse, FuelError> {
        let request = RetrieveRequest { properties, filter };
        self.call(Method::POST, object, Some("retrieve"), &request)
            .await
    }

    async fn post(
        &self,
        object: ObjectType,
        props: serde_json::Value,
    ) -> Result<FuelResponse, FuelError> {
        self.call(Method::POST, object, None, &props).await
    }

    async fn patch(
        &self,
        object: ObjectType,
        props: serde_json::Value,
    ) -> Result<FuelResponse, FuelError> {
        self.call(Method::PATCH, object, None, &props).await
    }

    async fn send(
        &self,
        object: ObjectType,
        props: serde_json::Value,
        subscribers: &[SubscriberRef],
    ) -> Result<FuelResponse, FuelError> {
        let request = SendRequest {
            definition: props,
            subscribers,
        };
        self.call(Method::POST, object, Some("send"), &request)
            .await
    }
}

/// Turns an HTTP answer into a [`FuelResponse`].
///
/// The status code is kept as-is. A JSON object body contributes its
/// `Results` array; any other body yields no results.
async fn decode_response(response: reqwest::Response) -> Result<FuelResponse, FuelError> {
    let code = response.status().as_u16();
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(FuelResponse {
            code,
            results: Vec::new(),
        });
    }

    let results = match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(serde_json::Value::Object(mut body)) => match body.remove("Results") {
            Some(serde_json::Value::Array(results)) => results,
            Some(other) => {
                return Err(FuelError::Decode(format!(
                    "'Results' is not an array: {}",
                    other
                )))
            }
            None => Vec::new(),
        },
        _ => Vec::new(),
    };
    Ok(FuelResponse { code, results })
}
