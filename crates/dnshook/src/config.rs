//! Hook configuration from the environment
//!
//! The registrar credential is required and read from `DREAMHOST_API_KEY`.
//! Everything else has a default and can be tuned with `DNSHOOK_*` variables.

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dnshook_dns::{
    ChallengeConfig, ChallengeOrchestrator, DreamhostClient, HickoryTxtResolver,
    PropagationChecker, StabilityPolicy, DEFAULT_HTTP_TIMEOUT, DREAMHOST_API_ROOT,
};
use dnshook_secrets::{SecretResolver, SecretUri};

/// Environment variable prefix
const ENV_PREFIX: &str = "DNSHOOK";

/// Holds the registrar API key (or a reference to it)
pub const API_KEY_ENV: &str = "DREAMHOST_API_KEY";

/// Resolved hook configuration
#[derive(Debug)]
pub struct HookConfig {
    pub api_key: String,
    pub api_root: String,
    /// Per-request limit for registrar calls
    pub http_timeout: Duration,
    pub challenge: ChallengeConfig,
    /// Name servers for propagation checks (empty = system resolver)
    pub nameservers: Vec<IpAddr>,
    pub deploy_config: Option<PathBuf>,
}

impl HookConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get_env = |name: &str| lookup(&format!("{}_{}", ENV_PREFIX, name));

        let api_key_source = lookup(API_KEY_ENV)
            .filter(|v| !v.trim().is_empty())
            .with_context(|| format!("Unable to locate Dreamhost API key: set {}", API_KEY_ENV))?;
        let api_key_uri: SecretUri = api_key_source
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {} value: {}", API_KEY_ENV, e))?;
        let api_key = SecretResolver::new()
            .resolve_trimmed(&api_key_uri)
            .map_err(|e| anyhow::anyhow!("Failed to resolve Dreamhost API key: {}", e))?;

        let api_root = get_env("API_ROOT").unwrap_or_else(|| DREAMHOST_API_ROOT.to_string());

        let defaults = ChallengeConfig::default();
        let secs = |name: &str, default: Duration| -> anyhow::Result<Duration> {
            Ok(parse_var::<u64>(name, get_env(name))?
                .map(Duration::from_secs)
                .unwrap_or(default))
        };

        let http_timeout = secs("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT)?;
        if http_timeout.is_zero() {
            anyhow::bail!("{}_HTTP_TIMEOUT_SECS must be at least 1", ENV_PREFIX);
        }

        let challenge = ChallengeConfig {
            settle_interval: secs("SETTLE_SECS", defaults.settle_interval)?,
            poll_interval: secs("POLL_SECS", defaults.poll_interval)?,
            cleanup_delay: secs("CLEANUP_SECS", defaults.cleanup_delay)?,
            required_sightings: parse_var("REQUIRED_SIGHTINGS", get_env("REQUIRED_SIGHTINGS"))?
                .unwrap_or(defaults.required_sightings),
            stability: parse_var::<StabilityPolicy>("STABILITY", get_env("STABILITY"))?
                .unwrap_or(defaults.stability),
            // 0 means poll forever
            max_poll_attempts: match parse_var::<u32>("MAX_POLLS", get_env("MAX_POLLS"))? {
                Some(0) => None,
                Some(max) => Some(max),
                None => defaults.max_poll_attempts,
            },
        };

        let nameservers = match get_env("NAMESERVERS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<IpAddr>()
                        .with_context(|| format!("Invalid name server address '{}'", s))
                })
                .collect::<anyhow::Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let deploy_config = get_env("DEPLOY_CONFIG").map(PathBuf::from);

        Ok(Self {
            api_key,
            api_root,
            http_timeout,
            challenge,
            nameservers,
            deploy_config,
        })
    }

    /// Wire the Dreamhost client and resolver into an orchestrator
    pub fn orchestrator(&self) -> anyhow::Result<ChallengeOrchestrator> {
        let registrar = Arc::new(
            DreamhostClient::new(self.api_key.clone(), self.http_timeout)
                .context("Failed to set up Dreamhost client")?
                .with_api_root(self.api_root.clone()),
        );
        let resolver = Arc::new(
            HickoryTxtResolver::new(&self.nameservers)
                .context("Failed to set up DNS resolver")?,
        );

        Ok(ChallengeOrchestrator::new(
            registrar,
            PropagationChecker::new(resolver),
            self.challenge.clone(),
        ))
    }
}

fn parse_var<T>(name: &str, value: Option<String>) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.trim().parse::<T>().map_err(|e| {
                anyhow::anyhow!("Invalid {}_{} value '{}': {}", ENV_PREFIX, name, v, e)
            })
        })
        .transpose()
}
