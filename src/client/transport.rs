//! HTTP transport for license server queries.

use crate::config::ClientConfig;
use crate::errors::{LicenseError, LicenseResult};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Issues a GET request and decodes the JSON body.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> LicenseResult<Value>;
}

/// [`HttpClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
    verify_tls: bool,
}

impl ReqwestHttpClient {
    /// Build a client with the given timeout.
    ///
    /// `verify_tls = false` accepts any server certificate; see
    /// [`ClientConfig::verify_tls`].
    pub fn new(timeout: Duration, verify_tls: bool) -> LicenseResult<Self> {
        if !verify_tls {
            tracing::warn!("TLS certificate verification is disabled for license queries");
        }

        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_tls)
            .user_agent(concat!("slm_client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LicenseError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, verify_tls })
    }

    /// Whether server certificates are checked.
    pub fn verifies_tls(&self) -> bool {
        self.verify_tls
    }

    pub fn from_config(config: &ClientConfig) -> LicenseResult<Self> {
        Self::new(Duration::from_secs(config.timeout_secs), config.verify_tls)
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> LicenseResult<Value> {
        let resp = self.client.get(url).query(query).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        // The server may pair an error status with a JSON verdict; the
        // verdict is what counts.
        match serde_json::from_str(&body) {
            Ok(json) => {
                if !status.is_success() {
                    tracing::debug!(%status, "license server answered with an error status");
                }
                Ok(json)
            }
            Err(_) if !status.is_success() => Err(LicenseError::ServerError(format!(
                "query failed with HTTP status {status}"
            ))),
            Err(e) => Err(LicenseError::InvalidResponse(format!("body is not JSON: {e}"))),
        }
    }
}
