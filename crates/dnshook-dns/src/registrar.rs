//! Registrar abstraction for challenge record management
//!
//! This trait allows for different registrar backends (Dreamhost, mocks for
//! testing, etc.)

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::DnsError;

pub const TXT_RECORD_TYPE: &str = "TXT";

/// A record as reported by the registrar's listing call
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistrarRecord {
    pub record: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: String,
}

impl RegistrarRecord {
    pub fn txt(record: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            record: record.into(),
            record_type: TXT_RECORD_TYPE.to_string(),
            value: value.into(),
        }
    }

    /// Whether this is a TXT record for `name` (case and trailing dot insensitive)
    pub fn is_txt_for(&self, name: &str) -> bool {
        self.record_type.eq_ignore_ascii_case(TXT_RECORD_TYPE)
            && self
                .record
                .trim_end_matches('.')
                .eq_ignore_ascii_case(name.trim_end_matches('.'))
    }
}

/// Envelope of every registrar response: `{result, data}`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub result: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.result == "success"
    }

    /// `data` rendered for log lines and error messages
    pub fn data_text(&self) -> String {
        match &self.data {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Record-management operations needed by a DNS-01 challenge
///
/// Implementations hold no per-challenge state; every call stands alone.
#[async_trait]
pub trait Registrar: Send + Sync {
    /// Short provider name for logging
    fn name(&self) -> &'static str;

    /// List every record the account manages
    async fn list_records(&self) -> Result<Vec<RegistrarRecord>, DnsError>;

    /// Create a TXT record
    ///
    /// Not idempotent: adding an existing name/value pair may create a
    /// duplicate, so callers check [`Registrar::list_records`] first.
    async fn add_record(&self, record: &str, value: &str) -> Result<ApiResponse, DnsError>;

    /// Delete the TXT record matching both `record` and `value` exactly
    async fn remove_record(&self, record: &str, value: &str) -> Result<ApiResponse, DnsError>;
}
