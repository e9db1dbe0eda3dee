//! Error types for the SLM license client.

use thiserror::Error;

/// Errors raised by the client's collaborators (storage, cache, transport)
/// and by configuration loading.
///
/// `LicenseClient` itself never surfaces these to callers; its public
/// operations degrade every failure to "not entitled".
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("network error: {0}")]
    NetworkError(String),

    /// The server answered with a non-success HTTP status and no JSON body.
    #[error("server error: {0}")]
    ServerError(String),

    /// The server body could not be decoded as JSON.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration is missing or malformed.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Local persistence failed.
    #[error("storage error: {0}")]
    StorageError(#[from] std::io::Error),

    /// A persisted value could not be (de)serialized.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<reqwest::Error> for LicenseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LicenseError::InvalidResponse(err.to_string())
        } else {
            LicenseError::NetworkError(err.to_string())
        }
    }
}

/// Result type for license client operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
