//! HTTP Backend Client
//!
//! `reqwest` implementation of [`CheckoutBackend`] against the storefront API.

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use storefront_core::SessionId;

use super::{
    CheckoutBackend, CreateSessionRequest, CreateSessionResponse, ModulesResponse, StatusResponse,
};
use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, Result};

/// Storefront API over HTTP
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a client for the API rooted at `base_url`
    pub fn new(base_url: &str, client: Client) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CheckoutError::Config(format!("Invalid backend URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CheckoutError::Config(format!("Backend URL cannot be a base: {base_url}")));
        }
        Ok(Self { client, base_url })
    }

    /// Create from configuration
    pub fn from_config(config: &CheckoutConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Self::new(&config.backend_url, client)
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append percent-encoded path segments to the base URL
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                CheckoutError::Config(format!("Backend URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Decode a success body, or turn an error reply into `CheckoutError::Backend`
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body["detail"]
            .as_str()
            .or_else(|| body["error"].as_str())
            .map_or_else(
                || status.canonical_reason().unwrap_or("Request failed").to_string(),
                ToString::to_string,
            );

        Err(CheckoutError::Backend {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl CheckoutBackend for HttpBackend {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse> {
        let url = self.endpoint(&["checkout", "session"])?;
        tracing::debug!(
            url = url.as_str(),
            package_id = %request.package_id,
            "Creating checkout session"
        );

        let response = self.client.post(url).json(request).send().await?;
        Self::decode(response).await
    }

    async fn checkout_status(&self, session_id: &SessionId) -> Result<StatusResponse> {
        let url = self.endpoint(&["checkout", "status", session_id.as_str()])?;
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    async fn modules(&self, session_id: &SessionId) -> Result<ModulesResponse> {
        let url = self.endpoint(&["modules", session_id.as_str()])?;
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    fn name(&self) -> &str {
        "http"
    }
}
