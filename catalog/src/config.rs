use crate::provider::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const ENV_BASE_URL: &str = "LOOKERSDK_BASE_URL";
pub const ENV_CLIENT_ID: &str = "LOOKERSDK_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "LOOKERSDK_CLIENT_SECRET";
pub const ENV_API_VERSION: &str = "LOOKERSDK_API_VERSION";
pub const ENV_TIMEOUT: &str = "LOOKERSDK_TIMEOUT";
pub const ENV_VERIFY_SSL: &str = "LOOKERSDK_VERIFY_SSL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookerConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub api_version: String,
    pub timeout: Duration,
    pub verify_ssl: bool,
}

impl Default for LookerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:19999".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            api_version: "4.0".to_string(),
            timeout: Duration::from_secs(120),
            verify_ssl: true,
        }
    }
}

/// One instance section of the configuration file.
#[derive(Debug, Deserialize)]
struct ConfigSection {
    base_url: String,
    client_id: String,
    client_secret: String,
    api_version: Option<String>,
    timeout: Option<u64>,
    verify_ssl: Option<bool>,
}

impl LookerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = client_id.into();
        self.client_secret = client_secret.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = verify_ssl;
        self
    }

    /// Read credentials from `LOOKERSDK_*` variables.
    ///
    /// Returns `None` unless the base URL, client id and client secret are all set.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var(ENV_BASE_URL).ok()?;
        let client_id = std::env::var(ENV_CLIENT_ID).ok()?;
        let client_secret = std::env::var(ENV_CLIENT_SECRET).ok()?;

        let mut config = Self::new()
            .with_base_url(base_url)
            .with_credentials(client_id, client_secret);

        if let Ok(version) = std::env::var(ENV_API_VERSION) {
            config.api_version = version;
        }
        if let Some(secs) = std::env::var(ENV_TIMEOUT)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(verify) = std::env::var(ENV_VERIFY_SSL) {
            config.verify_ssl = !matches!(verify.to_lowercase().as_str(), "false" | "0" | "no");
        }

        Some(config)
    }

    /// Parse one `[section]` table of a TOML configuration file.
    pub fn from_toml_str(contents: &str, section: &str) -> CatalogResult<Self> {
        let mut table: toml::Table =
            contents
                .parse()
                .map_err(|e: toml::de::Error| CatalogError::InvalidConfig {
                    message: format!("Invalid configuration file: {}", e),
                })?;

        let value = table
            .remove(section)
            .ok_or_else(|| CatalogError::InvalidConfig {
                message: format!("Section [{}] not found in configuration file", section),
            })?;

        let parsed: ConfigSection =
            value
                .try_into()
                .map_err(|e: toml::de::Error| CatalogError::InvalidConfig {
                    message: format!("Invalid section [{}]: {}", section, e),
                })?;

        let mut config = Self::new()
            .with_base_url(parsed.base_url)
            .with_credentials(parsed.client_id, parsed.client_secret);
        if let Some(version) = parsed.api_version {
            config.api_version = version;
        }
        if let Some(secs) = parsed.timeout {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(verify) = parsed.verify_ssl {
            config.verify_ssl = verify;
        }
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>, section: &str) -> CatalogResult<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| CatalogError::InvalidConfig {
                message: format!("Cannot read {}: {}", path.display(), e),
            })?;
        Self::from_toml_str(&contents, section)
    }

    /// Environment variables win over the configuration file.
    pub fn load(path: impl AsRef<Path>, section: &str) -> CatalogResult<Self> {
        let config = match Self::from_env() {
            Some(config) => {
                debug!("Using Looker credentials from environment");
                config
            }
            None => {
                debug!(
                    "Using Looker credentials from {} [{}]",
                    path.as_ref().display(),
                    section
                );
                Self::from_file(path, section)?
            }
        };

        config
            .validate()
            .map_err(|message| CatalogError::InvalidConfig { message })?;
        Ok(config)
    }

    /// Root of the versioned REST API, always ending in `/`.
    pub fn api_root(&self) -> String {
        format!(
            "{}/api/{}/",
            self.base_url.trim_end_matches('/'),
            self.api_version
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("Base URL cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("Base URL must start with http:// or https://".to_string());
        }

        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err("Client id and client secret are required".to_string());
        }

        if self.api_version.is_empty() {
            return Err("API version cannot be empty".to_string());
        }

        if self.timeout.is_zero() {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}
