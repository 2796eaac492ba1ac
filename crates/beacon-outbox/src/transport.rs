//! Transport: one request/response exchange per envelope.

use crate::{OutboxError, OutboxResult};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Longest response body excerpt kept in a failure message.
const MAX_ERROR_BODY_CHARS: usize = 256;

/// Delivers one serialized request body to the collector.
///
/// Implementations report failure through the returned error and never
/// panic into the sender.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, body: Vec<u8>) -> OutboxResult<()>;
}

/// HTTP transport: `POST` with JSON body and bearer token.
///
/// Success is decided by the status code alone; the body is only read to
/// enrich failure messages.
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl HttpTransport {
    /// Create a transport for `server_url`.
    pub fn new(server_url: &str, api_key: &str, timeout: Duration) -> OutboxResult<Self> {
        let endpoint = Url::parse(server_url)?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, body: Vec<u8>) -> OutboxResult<()> {
        debug!(url = %self.endpoint, bytes = body.len(), "Posting envelope");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let excerpt: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        Err(OutboxError::Send(format!("HTTP {}: {}", status, excerpt)))
    }
}
