use thiserror::Error;

/// Errors from registrar calls, DNS lookups and challenge orchestration
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The registrar answered with a non-2xx status
    #[error("Registrar returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The registrar answered, but reported a failure
    #[error("API error: {0}")]
    Api(String),

    #[error("DNS lookup failed: {0}")]
    Resolve(String),

    #[error("TXT record {record} not confirmed after {attempts} polls")]
    PropagationTimeout { record: String, attempts: u32 },
}

impl DnsError {
    /// Whether retrying the same request could reasonably succeed
    pub fn is_transient(&self) -> bool {
        match self {
            DnsError::Request(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            DnsError::Status { status, .. } => *status >= 500 || *status == 429,
            DnsError::Api(_) | DnsError::Resolve(_) | DnsError::PropagationTimeout { .. } => false,
        }
    }
}
