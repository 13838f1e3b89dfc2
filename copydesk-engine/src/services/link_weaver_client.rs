//! Link-insertion service client
//!
//! Given humanized HTML and a catalog of published articles, the external
//! service adds 3-5 internal anchors on existing text. The whole pass is
//! best-effort: callers fall back to the unlinked content when it fails, and
//! skip it entirely when the catalog is too thin to be useful.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::db::articles::CatalogEntry;
use crate::services::rate_limit::RateLimiter;

const USER_AGENT: &str = concat!("copydesk/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;
const RATE_LIMIT_MS: u64 = 500;

/// Catalogs below this size skip the link-insertion stage
pub const MIN_CATALOG_ENTRIES: usize = 3;

/// Link-insertion service errors
#[derive(Debug, Error)]
pub enum LinkInsertError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Response schema mismatch: {0}")]
    Schema(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkInsertRequest {
    pub content: String,
    pub catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkInsertResponse {
    /// HTML with internal anchors added
    pub content: String,
}

/// Link-insertion service client
pub struct LinkWeaverClient {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl LinkWeaverClient {
    pub fn new(base_url: String) -> Result<Self, LinkInsertError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LinkInsertError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            rate_limiter: RateLimiter::new(RATE_LIMIT_MS),
        })
    }

    /// Insert internal links from the catalog into the content
    pub async fn insert_links(&self, request: &LinkInsertRequest) -> Result<String, LinkInsertError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/v1/insert-links", self.base_url);
        tracing::debug!(
            catalog_entries = request.catalog.len(),
            content_chars = request.content.len(),
            "Requesting link insertion"
        );

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| LinkInsertError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LinkInsertError::Api(status.as_u16(), body));
        }

        let parsed = response
            .json::<LinkInsertResponse>()
            .await
            .map_err(|e| LinkInsertError::Schema(e.to_string()))?;

        Ok(parsed.content)
    }
}
