//! Draft-generation service client
//!
//! Wraps the external LLM draft service. The response is parsed into a strict
//! schema at this boundary; any shape mismatch is a client error and fails the
//! drafting stage. No loosely-typed JSON escapes into the pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::services::rate_limit::RateLimiter;

const USER_AGENT: &str = concat!("copydesk/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;
const RATE_LIMIT_MS: u64 = 500;

/// Draft service errors
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Response schema mismatch: {0}")]
    Schema(String),
}

/// Draft generation request
#[derive(Debug, Clone, Serialize)]
pub struct DraftRequest {
    pub idea_title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub content_type: String,
    pub target_word_count: usize,
}

/// One FAQ entry returned with a draft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftFaq {
    pub question: String,
    pub answer: String,
}

/// Structured draft response
#[derive(Debug, Clone, Deserialize)]
pub struct DraftResponse {
    pub title: String,
    pub excerpt: String,
    /// Article body as HTML
    pub content: String,
    pub meta_title: String,
    pub meta_description: String,
    pub focus_keyword: String,
    pub faqs: Vec<DraftFaq>,
}

/// Topic suggestion request (idea replenishment)
#[derive(Debug, Clone, Serialize)]
pub struct IdeaSuggestionRequest {
    pub count: usize,
    /// Existing titles the service must steer clear of
    pub existing_titles: Vec<String>,
}

/// One suggested topic
#[derive(Debug, Clone, Deserialize)]
pub struct IdeaSuggestion {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub content_type: String,
}

#[derive(Debug, Clone, Deserialize)]
struct IdeaSuggestionsResponse {
    ideas: Vec<IdeaSuggestion>,
}

/// Draft-generation service client
pub struct DraftClient {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl DraftClient {
    pub fn new(base_url: String) -> Result<Self, DraftError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DraftError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            rate_limiter: RateLimiter::new(RATE_LIMIT_MS),
        })
    }

    /// Generate a structured draft for an idea
    pub async fn generate(&self, request: &DraftRequest) -> Result<DraftResponse, DraftError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/v1/draft", self.base_url);
        tracing::debug!(
            idea_title = %request.idea_title,
            target_word_count = request.target_word_count,
            "Requesting draft generation"
        );

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| DraftError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DraftError::Api(status.as_u16(), body));
        }

        response
            .json::<DraftResponse>()
            .await
            .map_err(|e| DraftError::Schema(e.to_string()))
    }

    /// Ask the service for fresh topic suggestions
    pub async fn suggest_ideas(
        &self,
        request: &IdeaSuggestionRequest,
    ) -> Result<Vec<IdeaSuggestion>, DraftError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/v1/ideas", self.base_url);
        tracing::debug!(count = request.count, "Requesting idea suggestions");

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| DraftError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DraftError::Api(status.as_u16(), body));
        }

        let parsed = response
            .json::<IdeaSuggestionsResponse>()
            .await
            .map_err(|e| DraftError::Schema(e.to_string()))?;

        Ok(parsed.ideas)
    }
}
