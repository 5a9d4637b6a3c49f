//! Test doubles for the registrar and the TXT resolver

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use dnshook_dns::{
    ApiResponse, ChallengeConfig, DnsError, Registrar, RegistrarRecord, StabilityPolicy,
    TxtResolver,
};

/// A registrar call, as observed by [`MockRegistrar`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrarCall {
    List,
    Add(String, String),
    Remove(String, String),
}

/// In-memory registrar that records every call
#[derive(Default)]
pub struct MockRegistrar {
    records: Mutex<Vec<RegistrarRecord>>,
    calls: Mutex<Vec<RegistrarCall>>,
    fail_add: Mutex<bool>,
}

impl MockRegistrar {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_records(records: Vec<RegistrarRecord>) -> Arc<Self> {
        let registrar = Self::default();
        *registrar.records.lock() = records;
        Arc::new(registrar)
    }

    pub fn records(&self) -> Vec<RegistrarRecord> {
        self.records.lock().clone()
    }

    pub fn calls(&self) -> Vec<RegistrarCall> {
        self.calls.lock().clone()
    }

    /// Adds and removes seen so far
    pub fn mutations(&self) -> Vec<RegistrarCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, RegistrarCall::List))
            .collect()
    }

    pub fn set_fail_add(&self, fail: bool) {
        *self.fail_add.lock() = fail;
    }

    fn ok(data: &str) -> ApiResponse {
        ApiResponse {
            result: "success".to_string(),
            data: serde_json::Value::String(data.to_string()),
        }
    }
}

#[async_trait]
impl Registrar for MockRegistrar {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn list_records(&self) -> Result<Vec<RegistrarRecord>, DnsError> {
        self.calls.lock().push(RegistrarCall::List);
        Ok(self.records.lock().clone())
    }

    async fn add_record(&self, record: &str, value: &str) -> Result<ApiResponse, DnsError> {
        self.calls
            .lock()
            .push(RegistrarCall::Add(record.to_string(), value.to_string()));
        if *self.fail_add.lock() {
            return Err(DnsError::Api("dns-add_record failed: internal_error".into()));
        }
        self.records
            .lock()
            .push(RegistrarRecord::txt(record, value));
        Ok(Self::ok("record_added"))
    }

    async fn remove_record(&self, record: &str, value: &str) -> Result<ApiResponse, DnsError> {
        self.calls
            .lock()
            .push(RegistrarCall::Remove(record.to_string(), value.to_string()));
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|r| !(r.is_txt_for(record) && r.value == value));
        if records.len() == before {
            return Err(DnsError::Api("dns-remove_record failed: no_such_record".into()));
        }
        Ok(Self::ok("record_removed"))
    }
}

/// One scripted resolver answer
#[derive(Debug, Clone)]
pub enum Answer {
    Values(Vec<String>),
    Failure,
}

impl Answer {
    pub fn token(value: &str) -> Self {
        Answer::Values(vec![format!("\"{}\"", value)])
    }

    pub fn empty() -> Self {
        Answer::Values(Vec::new())
    }
}

/// Resolver replaying a fixed sequence of answers; the last one repeats
pub struct ScriptedResolver {
    answers: Mutex<VecDeque<Answer>>,
    last: Mutex<Answer>,
    lookups: Mutex<u32>,
}

impl ScriptedResolver {
    pub fn new(answers: Vec<Answer>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            last: Mutex::new(Answer::Failure),
            lookups: Mutex::new(0),
        })
    }

    pub fn lookups(&self) -> u32 {
        *self.lookups.lock()
    }
}

#[async_trait]
impl TxtResolver for ScriptedResolver {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        *self.lookups.lock() += 1;
        let answer = match self.answers.lock().pop_front() {
            Some(answer) => {
                *self.last.lock() = answer.clone();
                answer
            }
            None => self.last.lock().clone(),
        };
        match answer {
            Answer::Values(values) => Ok(values),
            Answer::Failure => Err(DnsError::Resolve(format!("{}: NXDOMAIN", name))),
        }
    }
}

/// Challenge config without any real waiting
pub fn instant_config() -> ChallengeConfig {
    ChallengeConfig {
        settle_interval: Duration::ZERO,
        poll_interval: Duration::ZERO,
        cleanup_delay: Duration::ZERO,
        required_sightings: 3,
        stability: StabilityPolicy::Consecutive,
        max_poll_attempts: Some(20),
    }
}

pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dnshook_dns=debug")
        .with_test_writer()
        .try_init();
}
