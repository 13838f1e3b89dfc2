//! Humanization service client
//!
//! Sends draft HTML (plus an optional contributor style profile) to the
//! external style-rewriting service and receives rewritten HTML with the same
//! semantic content and preserved heading structure.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::services::rate_limit::RateLimiter;

const USER_AGENT: &str = concat!("copydesk/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;
const RATE_LIMIT_MS: u64 = 500;

/// Humanization service errors
#[derive(Debug, Error)]
pub enum HumanizeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Response schema mismatch: {0}")]
    Schema(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct HumanizeRequest {
    /// Draft HTML to rewrite
    pub content: String,
    /// Contributor voice description; absence means house style
    pub style_profile: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HumanizeResponse {
    /// Rewritten HTML
    pub content: String,
}

/// Humanization service client
pub struct HumanizerClient {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl HumanizerClient {
    pub fn new(base_url: String) -> Result<Self, HumanizeError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| HumanizeError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            rate_limiter: RateLimiter::new(RATE_LIMIT_MS),
        })
    }

    /// Rewrite draft content in the given style
    pub async fn humanize(&self, request: &HumanizeRequest) -> Result<String, HumanizeError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/v1/humanize", self.base_url);
        tracing::debug!(
            content_chars = request.content.len(),
            has_style = request.style_profile.is_some(),
            "Requesting humanization"
        );

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| HumanizeError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HumanizeError::Api(status.as_u16(), body));
        }

        let parsed = response
            .json::<HumanizeResponse>()
            .await
            .map_err(|e| HumanizeError::Schema(e.to_string()))?;

        Ok(parsed.content)
    }
}
