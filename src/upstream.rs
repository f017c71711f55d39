//! Client for the receipt API that supplies the brand shown on each receipt.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::UpstreamConfig;

#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("External API timeout")]
    Timeout,
    #[error("Cannot connect to external API")]
    Connect,
    #[error("API error: {0}")]
    Status(u16),
    #[error("API request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_connect() {
            UpstreamError::Connect
        } else {
            UpstreamError::Other(err.to_string())
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Brand {
    pub name: String,
    pub domain: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UpstreamReceiptData {
    pub brand: Brand,
}

#[derive(Clone)]
pub struct UpstreamClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        Self::with_timeout(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    /// The timeout covers the whole exchange, connect through reading the body.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn create_receipt(
        &self,
        user_id: &str,
    ) -> Result<UpstreamReceiptData, UpstreamError> {
        let url = format!("{}/Receipt/create", self.base_url);
        tracing::info!(%url, user_id, "Calling external API");

        let response = self
            .http_client
            .post(&url)
            .query(&[("userId", user_id)])
            .send()
            .await?;

        let status = response.status();
        tracing::info!(status = status.as_u16(), "API response status");

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %body, "API error");
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let data = serde_json::from_str::<UpstreamReceiptData>(&body)
            .map_err(|err| UpstreamError::Other(err.to_string()))?;
        tracing::debug!(?data, "API response data");

        Ok(data)
    }
}
