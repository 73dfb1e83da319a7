//! Page fetching

use crate::error::{Error, Result};
use async_trait::async_trait;

/// Retrieves the raw body of one URL.
///
/// No retries: failures go straight back to the caller, which decides whether
/// they are fatal.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, failing with [`Error::Network`] on transport errors or
    /// non-success statuses
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetcher backed by a shared `reqwest` client
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Wrap an already configured client
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!(url, "fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::status(url, status.as_u16()));
        }

        response.text().await.map_err(|e| Error::transport(url, e))
    }
}
