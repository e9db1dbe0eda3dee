//! Configuration for the SLM license client.
//!
//! A [`ClientConfig`] can be built directly with [`ClientConfig::new`], or
//! loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `slm_client.toml` file (or an explicit path)
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `SLM_PLUGIN_ID` - Namespace prefix for persisted keys
//! - `SLM_PLUGIN_NAME` - Item reference sent to the server
//! - `SLM_SERVER_URL` - License server endpoint
//! - `SLM_SECRET_KEY` - Shared secret sent with every request
//! - `SLM_VERIFY_TLS` - Set to `false` to skip certificate verification
//! - `SLM_TIMEOUT_SECS` - Request timeout in seconds
//! - `SLM_DATA_DIR` - Directory for the file-backed store

use config::Config;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::errors::{LicenseError, LicenseResult};

/// Default request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Default license server URL.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

/// Immutable client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Plugin identifier, used as a prefix for every persisted key.
    pub plugin_id: String,
    /// Plugin display name, sent to the server as `item_reference`.
    pub plugin_name: String,
    /// License server endpoint. Queries are sent as GET requests to this URL.
    pub server_url: String,
    /// Shared secret sent on every request.
    pub secret_key: String,
    /// Verify the server's TLS certificate.
    ///
    /// Turning this off accepts any certificate, including self-signed and
    /// expired ones, and exposes the secret key to anyone able to intercept
    /// the connection. Only disable it for servers you reach over a trusted
    /// network.
    pub verify_tls: bool,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Directory used by the file-backed store. Defaults to the platform
    /// data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            plugin_id: String::new(),
            plugin_name: String::new(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            secret_key: String::new(),
            verify_tls: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: None,
        }
    }
}

impl ClientConfig {
    /// Build a configuration from the four required values.
    pub fn new(
        plugin_id: impl Into<String>,
        plugin_name: impl Into<String>,
        server_url: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            plugin_name: plugin_name.into(),
            server_url: server_url.into(),
            secret_key: secret_key.into(),
            ..Default::default()
        }
    }

    /// Disable TLS certificate verification. See [`ClientConfig::verify_tls`].
    pub fn danger_accept_invalid_certs(mut self) -> Self {
        self.verify_tls = false;
        self
    }

    /// Load configuration from `slm_client.toml` (if present) and the
    /// environment, then validate it.
    pub fn load() -> LicenseResult<Self> {
        Self::load_from(None)
    }

    /// Like [`ClientConfig::load`], reading the given file instead of
    /// `slm_client.toml`. The file must exist when a path is given.
    pub fn load_from(path: Option<&Path>) -> LicenseResult<Self> {
        let file_source = match path {
            Some(p) => config::File::from(p.to_path_buf()).required(true),
            None => config::File::with_name("slm_client").required(false),
        };

        let builder = Config::builder()
            .set_default("plugin_id", "")
            .map_err(config_err)?
            .set_default("plugin_name", "")
            .map_err(config_err)?
            .set_default("server_url", DEFAULT_SERVER_URL)
            .map_err(config_err)?
            .set_default("secret_key", "")
            .map_err(config_err)?
            .set_default("verify_tls", true)
            .map_err(config_err)?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS as i64)
            .map_err(config_err)?
            .add_source(file_source)
            .set_override_option("plugin_id", env::var("SLM_PLUGIN_ID").ok())
            .map_err(config_err)?
            .set_override_option("plugin_name", env::var("SLM_PLUGIN_NAME").ok())
            .map_err(config_err)?
            .set_override_option("server_url", env::var("SLM_SERVER_URL").ok())
            .map_err(config_err)?
            .set_override_option("secret_key", env::var("SLM_SECRET_KEY").ok())
            .map_err(config_err)?
            .set_override_option(
                "verify_tls",
                env::var("SLM_VERIFY_TLS")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(config_err)?
            .set_override_option(
                "timeout_secs",
                env::var("SLM_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(config_err)?
            .set_override_option("data_dir", env::var("SLM_DATA_DIR").ok())
            .map_err(config_err)?;

        let settings = builder
            .build()
            .map_err(|e| LicenseError::ConfigError(format!("failed to build config: {e}")))?;

        let config: ClientConfig = settings
            .try_deserialize()
            .map_err(|e| LicenseError::ConfigError(format!("failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LicenseResult<()> {
        if self.plugin_id.trim().is_empty() {
            return Err(LicenseError::ConfigError("plugin_id cannot be empty".to_string()));
        }
        if self.plugin_name.trim().is_empty() {
            return Err(LicenseError::ConfigError(
                "plugin_name cannot be empty".to_string(),
            ));
        }
        if self.secret_key.is_empty() {
            return Err(LicenseError::ConfigError("secret_key cannot be empty".to_string()));
        }

        match reqwest::Url::parse(&self.server_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(LicenseError::ConfigError(format!(
                    "server_url must use http or https, got '{}'",
                    url.scheme()
                )));
            }
            Err(e) => {
                return Err(LicenseError::ConfigError(format!(
                    "server_url '{}' is not a valid URL: {e}",
                    self.server_url
                )));
            }
        }

        if self.timeout_secs == 0 {
            return Err(LicenseError::ConfigError(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Persisted key holding the demo start date.
    pub fn demo_start_key(&self) -> String {
        format!("{}_demo_start", self.plugin_id)
    }

    /// Persisted key holding the license key.
    pub fn license_key_key(&self) -> String {
        format!("{}_license_key", self.plugin_id)
    }

    /// Cache key holding the last successful check result.
    pub fn license_data_key(&self) -> String {
        format!("{}_license_data", self.plugin_id)
    }
}

fn config_err(e: config::ConfigError) -> LicenseError {
    LicenseError::ConfigError(e.to_string())
}
