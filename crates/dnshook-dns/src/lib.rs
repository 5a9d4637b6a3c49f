//! DNS side of the dnshook DNS-01 hook
//!
//! - [`Registrar`] abstracts the registrar's record-management API, with
//!   [`DreamhostClient`] as the production implementation
//! - [`PropagationChecker`] answers "is this TXT value visible yet?"
//! - [`ChallengeOrchestrator`] drives a challenge from a clean record set to
//!   confirmed propagation, and cleans it up afterwards

mod challenge;
mod dreamhost;
mod error;
mod propagation;
mod registrar;

pub use challenge::{
    challenge_record_name, ChallengeConfig, ChallengeOrchestrator, ChallengeOutcome,
    ChallengeState, StabilityPolicy, ACME_CHALLENGE_PREFIX,
};
pub use dreamhost::{DreamhostClient, RetryPolicy, DEFAULT_HTTP_TIMEOUT, DREAMHOST_API_ROOT};
pub use error::DnsError;
pub use propagation::{strip_txt_quotes, HickoryTxtResolver, PropagationChecker, TxtResolver};
pub use registrar::{ApiResponse, Registrar, RegistrarRecord, TXT_RECORD_TYPE};
