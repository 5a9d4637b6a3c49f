//! Certificate deployment for dnshook
//!
//! After a certificate is issued, every configured live file is compared
//! with its freshly issued counterpart and replaced when they differ. The
//! previous version is kept next to it as `<file>.bak`. Post-deployment
//! actions run only when at least one file actually changed.

mod config;
mod coordinator;
mod error;
mod swap;

pub use config::{DeployConfig, DeploymentPair, DEFAULT_CERTS_DIR, DEPLOY_CONFIG_ENV};
pub use coordinator::{
    run_deployment, ActionOutcome, ActionRunner, DeployedFile, DeploymentReport, ShellRunner,
};
pub use error::DeployError;
pub use swap::{backup_path, deploy_file};
