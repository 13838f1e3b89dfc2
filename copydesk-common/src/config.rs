//! Configuration loading and data directory resolution
//!
//! Resolution follows the priority order used throughout copydesk:
//! 1. Environment variable (highest priority)
//! 2. TOML config file
//! 3. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// TOML configuration file contents
///
/// All fields are optional; unset fields fall back to environment variables or
/// compiled defaults at resolution time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Data directory holding copydesk.db
    pub data_dir: Option<String>,
    /// HTTP listen port for the engine service
    pub listen_port: Option<u16>,
    /// Base URL of the external draft-generation service
    pub draft_service_url: Option<String>,
    /// Base URL of the external humanization service
    pub humanizer_service_url: Option<String>,
    /// Base URL of the external link-insertion service
    pub link_service_url: Option<String>,
    /// Publishing endpoint URL (external CMS)
    pub publish_endpoint_url: Option<String>,
    /// Pre-shared publishing credential
    pub publish_credential: Option<String>,
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read config failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse config failed ({}): {}", path.display(), e)))
}

/// Write a TOML config file, creating parent directories as needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("copydesk").join("config.toml"))
}

/// Resolve the data directory (ENV -> TOML -> OS default)
pub fn resolve_data_dir(env_var_name: &str, toml_config: Option<&TomlConfig>) -> PathBuf {
    if let Ok(path) = std::env::var(env_var_name) {
        return PathBuf::from(path);
    }

    if let Some(dir) = toml_config.and_then(|c| c.data_dir.as_ref()) {
        return PathBuf::from(dir);
    }

    default_data_dir()
}

/// OS-dependent default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("copydesk"))
        .unwrap_or_else(|| PathBuf::from("./copydesk_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = TomlConfig {
            data_dir: Some("/var/lib/copydesk".to_string()),
            listen_port: Some(5810),
            draft_service_url: Some("http://localhost:9100".to_string()),
            ..Default::default()
        };

        write_toml_config(&config, &path).unwrap();
        let loaded = load_toml_config(&path).unwrap();

        assert_eq!(loaded.data_dir.as_deref(), Some("/var/lib/copydesk"));
        assert_eq!(loaded.listen_port, Some(5810));
        assert_eq!(loaded.publish_credential, None);
    }

    #[test]
    fn test_resolve_data_dir_prefers_toml_over_default() {
        let config = TomlConfig {
            data_dir: Some("/srv/copydesk".to_string()),
            ..Default::default()
        };
        // Env var name chosen to be unset in the test environment
        let dir = resolve_data_dir("COPYDESK_TEST_UNSET_DATA_DIR", Some(&config));
        assert_eq!(dir, PathBuf::from("/srv/copydesk"));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let result = load_toml_config(Path::new("/nonexistent/copydesk/config.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
