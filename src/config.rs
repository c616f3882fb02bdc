//! Client configuration
//!
//! Read from `<config_dir>/flashdeck/config.toml` unless another path is
//! given; every key is optional:
//! ```toml
//! api_base_url = "https://cards.example.com"
//! access_token = "..."
//! request_timeout_secs = 30
//! connect_timeout_secs = 10
//! default_order = "id"
//! data_file = "/home/me/.local/share/flashdeck/flashcards.json"
//! ```
//! `FLASHDECK_API_URL` and `FLASHDECK_ACCESS_TOKEN` override the file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::ListOrder;

pub const API_URL_ENV: &str = "FLASHDECK_API_URL";
pub const ACCESS_TOKEN_ENV: &str = "FLASHDECK_ACCESS_TOKEN";

const APP_DIR: &str = "flashdeck";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings for reaching the flashcards API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of the hosted API, without the `/api/flashcards` suffix
    pub api_base_url: String,
    /// Bearer token of the signed-in user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Order used for the initial browse listing
    pub default_order: ListOrder,
    /// Flashcards file for offline use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            access_token: None,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            default_order: ListOrder::Id,
            data_file: None,
        }
    }
}

impl ClientConfig {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Parse a config file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` or the default location, then apply env overrides
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(
            std::env::var(API_URL_ENV).ok(),
            std::env::var(ACCESS_TOKEN_ENV).ok(),
        );
        Ok(config)
    }

    /// Replace the URL and token with non-empty override values
    pub fn apply_overrides(&mut self, api_base_url: Option<String>, access_token: Option<String>) {
        if let Some(url) = api_base_url.filter(|u| !u.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            self.access_token = Some(token);
        }
    }

    /// Offline flashcards file, falling back to the platform data directory
    pub fn data_file(&self) -> Option<PathBuf> {
        self.data_file
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR).join("flashcards.json")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ClientConfig::load(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "api_base_url = \"https://cards.example.com\"\ndefault_order = \"random\"\n",
        )
        .unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.api_base_url, "https://cards.example.com");
        assert_eq!(config.default_order, ListOrder::Random);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.access_token, None);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "request_timeout_secs = \"soon\"").unwrap();

        assert!(matches!(ClientConfig::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_overrides_ignore_empty_values() {
        let mut config = ClientConfig::default();
        config.apply_overrides(Some(String::new()), Some("token".to_string()));
        assert_eq!(config.api_base_url, "http://localhost:3000");
        assert_eq!(config.access_token.as_deref(), Some("token"));
    }
}
