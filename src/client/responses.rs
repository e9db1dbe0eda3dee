//! Wire types for the Software License Manager protocol.
//!
//! Requests are plain query strings; responses are JSON objects such as:
//!
//! ```json
//! {
//!   "result": "success",
//!   "message": "License key details retrieved.",
//!   "status": "active",
//!   "product_ref": "pro-yearly",
//!   "date_expiry": "2025-01-01"
//! }
//! ```
//!
//! Missing fields decode to defaults rather than failing, so a response
//! without `result` simply reads as "not successful".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote operation requested via `slm_action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlmAction {
    Activate,
    Check,
    Deactivate,
}

impl SlmAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlmAction::Activate => "slm_activate",
            SlmAction::Check => "slm_check",
            SlmAction::Deactivate => "slm_deactivate",
        }
    }
}

impl fmt::Display for SlmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome reported in the `result` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryResult {
    Success,
    Error,
    /// Anything else, including a missing field.
    #[default]
    #[serde(other)]
    Other,
}

/// License state reported in the `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    Active,
    Inactive,
    Pending,
    Blocked,
    Expired,
    #[default]
    #[serde(other)]
    Other,
}

/// Decoded body of any SLM query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlmResponse {
    pub result: QueryResult,
    pub status: LicenseStatus,
    pub product_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_expiry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SlmResponse {
    pub fn is_success(&self) -> bool {
        self.result == QueryResult::Success
    }
}

/// Result of the last successful `slm_check`, as held in memory and in the
/// TTL cache.
pub type LicenseData = SlmResponse;

impl LicenseData {
    /// True when the server reported the license as active.
    pub fn is_active(&self) -> bool {
        self.status == LicenseStatus::Active
    }
}
