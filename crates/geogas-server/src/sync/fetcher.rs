// Upstream document fetcher (HTTP)

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use std::time::Duration;
use tracing::{debug, info};

use super::{FetchError, RawDocument, SyncConfig};

/// Source of raw upstream documents
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Retrieve the document at `url`. No retries are attempted.
    async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError>;
}

/// HTTP implementation of [`DocumentSource`]
///
/// Owns its own `reqwest::Client`, built with the configured timeout. Each
/// server instance constructs one and hands it to the orchestrator.
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    client: Client,
    timeout_secs: u64,
}

impl DocumentFetcher {
    /// Wrap an already configured client. `timeout_secs` is only used for error reporting.
    pub fn new(client: Client, timeout_secs: u64) -> Self {
        Self {
            client,
            timeout_secs,
        }
    }

    /// Build a dedicated client from the sync configuration
    pub fn from_config(config: &SyncConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self::new(client, config.timeout_secs))
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl DocumentSource for DocumentFetcher {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError> {
        info!("Fetching upstream document");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                code: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(|e| self.classify(e))?;

        debug!(
            bytes = body.len(),
            content_type = content_type.as_deref().unwrap_or("unknown"),
            "Downloaded upstream document"
        );

        Ok(RawDocument { body, content_type })
    }
}
