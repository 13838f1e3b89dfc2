//! Publishing endpoint client
//!
//! Pushes finished articles to the external CMS. Two hard preconditions run
//! server-side, immediately before the HTTP call:
//! - every `[tag ...]` shortcode in the content must be on the allow-list
//! - at least one monetization-class shortcode must be present
//!
//! Both reject with a reason; neither is a warning. Authentication is a
//! pre-shared credential; publishing without one is a configuration error.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::utils::html;

const USER_AGENT: &str = concat!("copydesk/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Publishing errors
#[derive(Debug, Error)]
pub enum PublishError {
    /// Content carries a shortcode not on the allow-list
    #[error("Unknown shortcode rejected: [{0}]")]
    UnknownShortcode(String),

    /// Content lacks any monetization-class shortcode
    #[error("No monetization shortcode present in content")]
    MissingMonetization,

    /// No publish credential configured
    #[error("Publish credential not configured")]
    MissingCredential,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Response schema mismatch: {0}")]
    Schema(String),
}

/// Shortcode allow-list and monetization class
#[derive(Debug, Clone)]
pub struct ShortcodePolicy {
    pub allowed: Vec<String>,
    pub monetization: Vec<String>,
}

impl Default for ShortcodePolicy {
    fn default() -> Self {
        Self {
            allowed: ["affil_offer", "rate_table", "cta_button", "disclosure", "calculator"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            monetization: ["affil_offer", "rate_table"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ShortcodePolicy {
    /// Whether any monetization-class shortcode appears in the content
    pub fn has_monetization(&self, content: &str) -> bool {
        html::shortcode_tags(content)
            .iter()
            .any(|tag| self.monetization.contains(tag))
    }

    /// Enforce both shortcode preconditions
    pub fn validate(&self, content: &str) -> Result<(), PublishError> {
        let tags = html::shortcode_tags(content);

        if let Some(unknown) = tags.iter().find(|tag| !self.allowed.contains(tag)) {
            return Err(PublishError::UnknownShortcode(unknown.clone()));
        }

        if !tags.iter().any(|tag| self.monetization.contains(tag)) {
            return Err(PublishError::MissingMonetization);
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishRequest {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub status: String,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishResponse {
    pub id: i64,
    /// Live URL of the published article
    pub link: String,
}

/// Publishing endpoint client
pub struct PublisherClient {
    http_client: reqwest::Client,
    endpoint_url: String,
    credential: String,
    policy: ShortcodePolicy,
}

impl PublisherClient {
    pub fn new(
        endpoint_url: String,
        credential: String,
        policy: ShortcodePolicy,
    ) -> Result<Self, PublishError> {
        if credential.trim().is_empty() {
            return Err(PublishError::MissingCredential);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| PublishError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint_url,
            credential,
            policy,
        })
    }

    pub fn policy(&self) -> &ShortcodePolicy {
        &self.policy
    }

    /// Validate and publish an article
    pub async fn publish(&self, request: &PublishRequest) -> Result<PublishResponse, PublishError> {
        self.policy.validate(&request.content)?;

        tracing::debug!(title = %request.title, "Publishing article");

        let response = self
            .http_client
            .post(&self.endpoint_url)
            .bearer_auth(&self.credential)
            .json(request)
            .send()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Api(status.as_u16(), body));
        }

        response
            .json::<PublishResponse>()
            .await
            .map_err(|e| PublishError::Schema(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_shortcode_rejected() {
        let policy = ShortcodePolicy::default();
        let content = r#"<p>[affil_offer id="1"] and [totally_unknown]</p>"#;
        match policy.validate(content) {
            Err(PublishError::UnknownShortcode(tag)) => assert_eq!(tag, "totally_unknown"),
            other => panic!("expected UnknownShortcode, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_monetization_rejected() {
        let policy = ShortcodePolicy::default();
        let content = "<p>[disclosure] plain content</p>";
        assert!(matches!(
            policy.validate(content),
            Err(PublishError::MissingMonetization)
        ));
    }

    #[test]
    fn test_valid_content_passes() {
        let policy = ShortcodePolicy::default();
        let content = r#"<p>[disclosure] Intro. [affil_offer id="9"]</p>"#;
        assert!(policy.validate(content).is_ok());
        assert!(policy.has_monetization(content));
    }

    #[test]
    fn test_empty_credential_is_configuration_error() {
        let result = PublisherClient::new(
            "https://cms.example/wp-json/posts".to_string(),
            "   ".to_string(),
            ShortcodePolicy::default(),
        );
        assert!(matches!(result, Err(PublishError::MissingCredential)));
    }
}
