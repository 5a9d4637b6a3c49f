use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

use crate::error::DnsError;
use crate::registrar::{ApiResponse, Registrar, RegistrarRecord, TXT_RECORD_TYPE};

pub const DREAMHOST_API_ROOT: &str = "https://api.dreamhost.com/";

/// Upper bound on a single registrar request, connect to last byte
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// How often a failed registrar call is repeated before giving up
///
/// Only transient failures (transport errors, 5xx, 429) are retried. A
/// registrar that answers `result: error` has rejected the request and
/// asking again will not change its mind.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Command {
    ListRecords,
    AddRecord,
    RemoveRecord,
}

impl Command {
    fn as_str(self) -> &'static str {
        match self {
            Command::ListRecords => "dns-list_records",
            Command::AddRecord => "dns-add_record",
            Command::RemoveRecord => "dns-remove_record",
        }
    }
}

/// Query string of one API call, built fresh for every logical call
///
/// Retries reuse the same params, so the registrar sees the same
/// `unique_id` and applies a repeated mutation at most once.
#[derive(Debug, Serialize)]
struct ApiParams<'a> {
    key: &'a str,
    format: &'static str,
    cmd: &'static str,
    unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<&'a str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    record_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
}

impl<'a> ApiParams<'a> {
    fn new(key: &'a str, cmd: Command) -> Self {
        Self {
            key,
            format: "json",
            cmd: cmd.as_str(),
            unique_id: Uuid::new_v4().to_string(),
            record: None,
            record_type: None,
            value: None,
        }
    }

    fn txt(key: &'a str, cmd: Command, record: &'a str, value: &'a str) -> Self {
        Self {
            record: Some(record),
            record_type: Some(TXT_RECORD_TYPE),
            value: Some(value),
            ..Self::new(key, cmd)
        }
    }
}

/// Dreamhost API client for TXT record management
pub struct DreamhostClient {
    client: Client,
    api_key: String,
    api_root: String,
    retry: RetryPolicy,
}

impl DreamhostClient {
    /// Create a client whose requests give up after `timeout`
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, DnsError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            api_root: DREAMHOST_API_ROOT.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Point the client at a different endpoint (staging, mock servers)
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn call(&self, params: &ApiParams<'_>) -> Result<ApiResponse, DnsError> {
        let mut attempt = 1;
        loop {
            match self.call_once(params).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    tracing::warn!(
                        "Dreamhost {} failed (attempt {}/{}): {}, retrying in {}s",
                        params.cmd,
                        attempt,
                        self.retry.max_attempts,
                        e,
                        self.retry.delay.as_secs()
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn call_once(&self, params: &ApiParams<'_>) -> Result<ApiResponse, DnsError> {
        let response = self
            .client
            .get(&self.api_root)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DnsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result: ApiResponse = response.json().await?;
        if result.is_success() {
            Ok(result)
        } else {
            Err(DnsError::Api(format!(
                "{} failed: {}",
                params.cmd,
                result.data_text()
            )))
        }
    }
}

#[async_trait]
impl Registrar for DreamhostClient {
    fn name(&self) -> &'static str {
        "dreamhost"
    }

    async fn list_records(&self) -> Result<Vec<RegistrarRecord>, DnsError> {
        let response = self
            .call(&ApiParams::new(&self.api_key, Command::ListRecords))
            .await?;

        serde_json::from_value(response.data)
            .map_err(|e| DnsError::Api(format!("Unexpected record listing: {}", e)))
    }

    async fn add_record(&self, record: &str, value: &str) -> Result<ApiResponse, DnsError> {
        tracing::info!("Adding TXT record {} = {}", record, value);

        let response = self
            .call(&ApiParams::txt(
                &self.api_key,
                Command::AddRecord,
                record,
                value,
            ))
            .await?;

        tracing::info!("{}: {}", response.data_text(), response.result);
        Ok(response)
    }

    async fn remove_record(&self, record: &str, value: &str) -> Result<ApiResponse, DnsError> {
        tracing::info!("Removing TXT record {} = {}", record, value);

        let response = self
            .call(&ApiParams::txt(
                &self.api_key,
                Command::RemoveRecord,
                record,
                value,
            ))
            .await?;

        tracing::info!("{}: {}", response.data_text(), response.result);
        Ok(response)
    }
}
