//! DNS-01 challenge management
//!
//! Orchestrates the DNS-01 challenge flow:
//! 1. Remove any leftover TXT records for the challenge name
//! 2. Publish the new token via the registrar
//! 3. Poll DNS until the token has been seen enough times in a row
//! 4. Remove the record once the CA has validated it

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::DnsError;
use crate::propagation::PropagationChecker;
use crate::registrar::Registrar;

pub const ACME_CHALLENGE_PREFIX: &str = "_acme-challenge";

/// `_acme-challenge.<domain>`, without a trailing dot
pub fn challenge_record_name(domain: &str) -> String {
    format!("{}.{}", ACME_CHALLENGE_PREFIX, domain.trim_end_matches('.'))
}

/// How sightings of the token add up towards confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StabilityPolicy {
    /// A poll that misses the token resets the count
    #[default]
    Consecutive,
    /// Every sighting counts, misses are ignored
    Cumulative,
}

impl FromStr for StabilityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "consecutive" | "strict" => Ok(StabilityPolicy::Consecutive),
            "cumulative" | "loose" => Ok(StabilityPolicy::Cumulative),
            other => Err(format!(
                "unknown stability policy '{}', expected 'consecutive' or 'cumulative'",
                other
            )),
        }
    }
}

/// Timing and confirmation policy of a challenge
#[derive(Debug, Clone)]
pub struct ChallengeConfig {
    /// Wait after a registrar mutation before relying on it
    pub settle_interval: Duration,
    /// Wait between two propagation polls
    pub poll_interval: Duration,
    /// Wait before removing a record during cleanup
    pub cleanup_delay: Duration,
    /// Sightings needed before propagation is confirmed
    pub required_sightings: u32,
    pub stability: StabilityPolicy,
    /// Give up after this many polls (`None` polls forever)
    pub max_poll_attempts: Option<u32>,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            settle_interval: Duration::from_secs(10),
            poll_interval: Duration::from_secs(30),
            cleanup_delay: Duration::from_secs(30),
            required_sightings: 3,
            stability: StabilityPolicy::Consecutive,
            max_poll_attempts: Some(40),
        }
    }
}

/// Where a challenge currently is, used for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeState {
    Idle,
    CheckingExisting,
    RemovingStale,
    Adding,
    Settling,
    Polling,
    Confirmed,
    Removing,
    Done,
}

impl fmt::Display for ChallengeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChallengeState::Idle => "idle",
            ChallengeState::CheckingExisting => "checking-existing",
            ChallengeState::RemovingStale => "removing-stale",
            ChallengeState::Adding => "adding",
            ChallengeState::Settling => "settling",
            ChallengeState::Polling => "polling",
            ChallengeState::Confirmed => "confirmed",
            ChallengeState::Removing => "removing",
            ChallengeState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of a confirmed challenge deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeOutcome {
    pub record: String,
    /// Leftover records removed before the token was added
    pub removed_stale: usize,
    /// Propagation polls it took to confirm
    pub polls: u32,
}

/// Sighting count of a single challenge attempt
#[derive(Debug)]
struct SightingCounter {
    policy: StabilityPolicy,
    required: u32,
    seen: u32,
}

impl SightingCounter {
    fn new(policy: StabilityPolicy, required: u32) -> Self {
        Self {
            policy,
            required: required.max(1),
            seen: 0,
        }
    }

    /// Record one poll; returns true once propagation is confirmed
    fn record(&mut self, sighted: bool) -> bool {
        if sighted {
            self.seen += 1;
        } else if self.policy == StabilityPolicy::Consecutive {
            self.seen = 0;
        }
        self.seen >= self.required
    }

    fn seen(&self) -> u32 {
        self.seen
    }
}

/// DNS-01 challenge orchestrator
///
/// Coordinates registrar record changes and propagation polling. Challenges
/// are handled one at a time; nothing is shared between two calls.
pub struct ChallengeOrchestrator {
    registrar: Arc<dyn Registrar>,
    checker: PropagationChecker,
    config: ChallengeConfig,
}

impl ChallengeOrchestrator {
    pub fn new(
        registrar: Arc<dyn Registrar>,
        checker: PropagationChecker,
        config: ChallengeConfig,
    ) -> Self {
        Self {
            registrar,
            checker,
            config,
        }
    }

    /// Publish `token` for `domain` and wait until it has propagated
    ///
    /// Any TXT record already published under the challenge name is removed
    /// first, so exactly one record (the new token) exists afterwards.
    pub async fn deploy_challenge(
        &self,
        domain: &str,
        token: &str,
    ) -> Result<ChallengeOutcome, DnsError> {
        let record = challenge_record_name(domain);
        self.enter(&record, ChallengeState::Idle);

        self.enter(&record, ChallengeState::CheckingExisting);
        tracing::info!("Checking if TXT record for {} exists...", record);
        let stale = self.existing_values(&record).await?;

        if !stale.is_empty() {
            self.enter(&record, ChallengeState::RemovingStale);
            tracing::info!("Old TXT record found, removing...");
            for value in &stale {
                self.registrar.remove_record(&record, value).await?;
            }
            self.settle().await;
        }

        self.enter(&record, ChallengeState::Adding);
        self.registrar.add_record(&record, token).await?;

        self.enter(&record, ChallengeState::Settling);
        self.settle().await;

        self.enter(&record, ChallengeState::Polling);
        let polls = self.wait_for_propagation(&record, token).await?;

        self.enter(&record, ChallengeState::Confirmed);
        tracing::info!("TXT record {} propagated after {} polls", record, polls);

        Ok(ChallengeOutcome {
            record,
            removed_stale: stale.len(),
            polls,
        })
    }

    /// Remove any challenge record left for `domain`
    ///
    /// Returns how many records were removed. With nothing published this
    /// makes no registrar mutation at all.
    pub async fn clean_challenge(&self, domain: &str) -> Result<usize, DnsError> {
        let record = challenge_record_name(domain);
        self.enter(&record, ChallengeState::Idle);

        self.enter(&record, ChallengeState::CheckingExisting);
        tracing::info!("Checking if TXT record for {} exists...", record);
        let existing = self.existing_values(&record).await?;

        if existing.is_empty() {
            tracing::info!("No TXT record for {}, nothing to clean", record);
            self.enter(&record, ChallengeState::Done);
            return Ok(0);
        }

        tracing::info!(
            "Old TXT record found, waiting {}s before removing...",
            self.config.cleanup_delay.as_secs()
        );
        tokio::time::sleep(self.config.cleanup_delay).await;

        self.enter(&record, ChallengeState::Removing);
        for value in &existing {
            self.registrar.remove_record(&record, value).await?;
        }

        self.enter(&record, ChallengeState::Done);
        Ok(existing.len())
    }

    /// Values of every TXT record currently published under `record`
    async fn existing_values(&self, record: &str) -> Result<Vec<String>, DnsError> {
        let records = self.registrar.list_records().await?;
        Ok(records
            .into_iter()
            .filter(|r| r.is_txt_for(record))
            .map(|r| r.value)
            .collect())
    }

    async fn wait_for_propagation(&self, record: &str, token: &str) -> Result<u32, DnsError> {
        let mut counter =
            SightingCounter::new(self.config.stability, self.config.required_sightings);
        let mut attempts = 0;

        loop {
            attempts += 1;
            let sighted = self.checker.has_propagated(record, token).await;
            if counter.record(sighted) {
                return Ok(attempts);
            }

            if sighted {
                tracing::info!("New record seen {} times", counter.seen());
            } else {
                tracing::info!("DNS not propagated (seen {} times)", counter.seen());
            }

            if let Some(max) = self.config.max_poll_attempts {
                if attempts >= max {
                    tracing::error!("Giving up on {} after {} polls", record, attempts);
                    return Err(DnsError::PropagationTimeout {
                        record: record.to_string(),
                        attempts,
                    });
                }
            }

            tracing::info!(
                "Waiting {}s before next check...",
                self.config.poll_interval.as_secs()
            );
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn settle(&self) {
        tracing::info!(
            "Settling down for {}s...",
            self.config.settle_interval.as_secs()
        );
        tokio::time::sleep(self.config.settle_interval).await;
    }

    fn enter(&self, record: &str, state: ChallengeState) {
        tracing::debug!(
            record = %record,
            registrar = self.registrar.name(),
            state = %state,
            "Challenge state"
        );
    }
}
