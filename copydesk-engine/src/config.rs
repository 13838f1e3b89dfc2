//! Configuration resolution for the copydesk engine
//!
//! Service configuration resolves ENV → TOML → compiled default. The publish
//! credential is the one secret and resolves Database → ENV → TOML; publishing
//! is disabled (not defaulted) when no credential is found anywhere.

use copydesk_common::config::{default_config_path, load_toml_config, resolve_data_dir, TomlConfig};
use copydesk_common::{Error, Result};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tracing::{info, warn};

const DEFAULT_LISTEN_PORT: u16 = 5810;
const DEFAULT_DRAFT_URL: &str = "http://127.0.0.1:9300";
const DEFAULT_HUMANIZER_URL: &str = "http://127.0.0.1:9301";
const DEFAULT_LINK_URL: &str = "http://127.0.0.1:9302";

/// Resolved engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    pub listen_port: u16,
    pub draft_service_url: String,
    pub humanizer_service_url: String,
    pub link_service_url: String,
    pub publish_endpoint_url: Option<String>,
}

impl EngineConfig {
    /// SQLite database path inside the data directory
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("copydesk.db")
    }
}

/// Resolve engine configuration (ENV → TOML → defaults)
pub fn resolve_config() -> EngineConfig {
    let toml_config = default_config_path()
        .filter(|p| p.exists())
        .and_then(|p| match load_toml_config(&p) {
            Ok(config) => {
                info!("Loaded config file: {}", p.display());
                Some(config)
            }
            Err(e) => {
                warn!("Ignoring unreadable config file: {}", e);
                None
            }
        })
        .unwrap_or_default();

    let env_or = |env_var: &str, toml_value: Option<&String>, default: &str| -> String {
        std::env::var(env_var)
            .ok()
            .or_else(|| toml_value.cloned())
            .unwrap_or_else(|| default.to_string())
    };

    let listen_port = std::env::var("COPYDESK_LISTEN_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .or(toml_config.listen_port)
        .unwrap_or(DEFAULT_LISTEN_PORT);

    EngineConfig {
        data_dir: resolve_data_dir("COPYDESK_DATA_DIR", Some(&toml_config)),
        listen_port,
        draft_service_url: env_or(
            "COPYDESK_DRAFT_SERVICE_URL",
            toml_config.draft_service_url.as_ref(),
            DEFAULT_DRAFT_URL,
        ),
        humanizer_service_url: env_or(
            "COPYDESK_HUMANIZER_SERVICE_URL",
            toml_config.humanizer_service_url.as_ref(),
            DEFAULT_HUMANIZER_URL,
        ),
        link_service_url: env_or(
            "COPYDESK_LINK_SERVICE_URL",
            toml_config.link_service_url.as_ref(),
            DEFAULT_LINK_URL,
        ),
        publish_endpoint_url: std::env::var("COPYDESK_PUBLISH_ENDPOINT_URL")
            .ok()
            .or(toml_config.publish_endpoint_url),
    }
}

/// Resolve the publish credential from 3-tier configuration
///
/// **Priority:** Database → ENV → TOML. Errors when no valid credential is
/// configured anywhere; publishing without authentication is never defaulted.
pub async fn resolve_publish_credential(
    db: &SqlitePool,
    toml_config: &TomlConfig,
) -> Result<String> {
    let db_key: Option<String> = crate::db::settings::get_setting(db, "publish_credential")
        .await
        .map_err(|e| Error::Config(e.to_string()))?;
    let env_key = std::env::var("COPYDESK_PUBLISH_CREDENTIAL").ok();
    let toml_key = toml_config.publish_credential.as_ref();

    let sources: Vec<&str> = [
        db_key.as_ref().filter(|k| is_valid_key(k)).map(|_| "database"),
        env_key.as_ref().filter(|k| is_valid_key(k)).map(|_| "environment"),
        toml_key.filter(|k| is_valid_key(k)).map(|_| "TOML"),
    ]
    .into_iter()
    .flatten()
    .collect();

    if sources.len() > 1 {
        warn!(
            "Publish credential found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(key) = db_key.filter(|k| is_valid_key(k)) {
        info!("Publish credential loaded from database");
        return Ok(key);
    }
    if let Some(key) = env_key.filter(|k| is_valid_key(k)) {
        info!("Publish credential loaded from environment variable");
        return Ok(key);
    }
    if let Some(key) = toml_key.filter(|k| is_valid_key(k)) {
        info!("Publish credential loaded from TOML config");
        return Ok(key.clone());
    }

    Err(Error::Config(
        "Publish credential not configured. Set it via:\n\
         1. Settings table key: publish_credential\n\
         2. Environment: COPYDESK_PUBLISH_CREDENTIAL=your-token\n\
         3. TOML config: ~/.config/copydesk/config.toml (publish_credential = \"your-token\")"
            .to_string(),
    ))
}

/// Validate a credential (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn test_key_validation() {
        assert!(is_valid_key("token-123"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[tokio::test]
    async fn test_database_credential_wins() {
        let pool = test_pool().await;
        crate::db::settings::set_setting(&pool, "publish_credential", "db-token")
            .await
            .unwrap();

        let toml = TomlConfig {
            publish_credential: Some("toml-token".to_string()),
            ..Default::default()
        };

        let key = resolve_publish_credential(&pool, &toml).await.unwrap();
        assert_eq!(key, "db-token");
    }

    #[tokio::test]
    async fn test_missing_credential_is_config_error() {
        let pool = test_pool().await;
        let result = resolve_publish_credential(&pool, &TomlConfig::default()).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_toml_fallback() {
        let pool = test_pool().await;
        let toml = TomlConfig {
            publish_credential: Some("toml-token".to_string()),
            ..Default::default()
        };
        let key = resolve_publish_credential(&pool, &toml).await.unwrap();
        assert_eq!(key, "toml-token");
    }
}
