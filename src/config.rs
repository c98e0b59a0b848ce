//! Configuration management.
//!
//! Config is stored at `~/.config/tiersync/config.toml` and contains:
//! - shop domain and Admin API access token
//! - API version, database location and sweep tuning

use std::path::PathBuf;

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::tiering::DEFAULT_PAGE_SIZE;

const CONFIG_DIR: &str = "tiersync";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "tiers.sqlite";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Shop domain, e.g. `acme.myshopify.com`.
    #[serde(default)]
    pub shop: Option<String>,

    /// Admin API access token.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Admin API version (default: 2025-01).
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// SQLite database path (default: `<data dir>/tiersync/tiers.sqlite`).
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Customers per page during recalculation (at most 250).
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Customers processed concurrently within a page.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_api_version() -> String {
    "2025-01".to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_concurrency() -> usize {
    1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            shop: None,
            access_token: None,
            api_version: default_api_version(),
            database_path: None,
            page_size: default_page_size(),
            concurrency: default_concurrency(),
        }
    }
}

impl AppConfig {
    /// Load config from the default location.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&path, content).context("Failed to write config file")
    }

    /// Get the access token as a SecretString.
    pub fn access_token_secret(&self) -> Option<SecretString> {
        self.access_token
            .clone()
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token
            .as_ref()
            .map(|t| !t.is_empty())
            .unwrap_or(false)
    }

    /// The configured shop, or an error telling the user how to set one.
    pub fn require_shop(&self) -> Result<&str> {
        self.shop
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .context("No shop configured. Run: tiers config set-shop <domain> or pass --shop")
    }

    /// The access token, or an error telling the user how to set one.
    pub fn require_access_token(&self) -> Result<SecretString> {
        self.access_token_secret()
            .context("No access token configured. Run: tiers config set-token <token> or pass --token")
    }

    /// Resolved database path.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir().context("Could not determine data directory")?;

        Ok(data_dir.join(CONFIG_DIR).join(DATABASE_FILE))
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.shop.is_none());
        assert!(config.access_token.is_none());
        assert_eq!(config.api_version, "2025-01");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn test_has_access_token() {
        let mut config = AppConfig::default();
        assert!(!config.has_access_token());
        assert!(config.require_access_token().is_err());

        config.access_token = Some(String::new());
        assert!(!config.has_access_token());
        assert!(config.access_token_secret().is_none());

        config.access_token = Some("shpat_123".to_string());
        assert!(config.has_access_token());
        assert!(config.require_access_token().is_ok());
    }

    #[test]
    fn test_require_shop() {
        let mut config = AppConfig::default();
        assert!(config.require_shop().is_err());

        config.shop = Some("  ".to_string());
        assert!(config.require_shop().is_err());

        config.shop = Some("acme.myshopify.com".to_string());
        assert_eq!(config.require_shop().unwrap(), "acme.myshopify.com");
    }

    #[test]
    fn test_explicit_database_path() {
        let config = AppConfig {
            database_path: Some(PathBuf::from("/tmp/t.sqlite")),
            ..AppConfig::default()
        };
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/t.sqlite"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: AppConfig = toml::from_str("shop = \"acme.myshopify.com\"\n").unwrap();
        assert_eq!(parsed.shop.as_deref(), Some("acme.myshopify.com"));
        assert_eq!(parsed.api_version, "2025-01");
        assert_eq!(parsed.page_size, 50);
    }

    #[test]
    fn test_serialize_deserialize() {
        let mut config = AppConfig::default();
        config.shop = Some("acme.myshopify.com".to_string());
        config.access_token = Some("shpat_test".to_string());
        config.concurrency = 4;

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.shop, config.shop);
        assert_eq!(parsed.access_token, config.access_token);
        assert_eq!(parsed.concurrency, 4);
    }
}
