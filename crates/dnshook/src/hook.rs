//! Hook operations as invoked by dehydrated
//!
//! dehydrated calls the hook as `dnshook <operation> [args...]`. Operations
//! this hook does not know about are ignored so newer dehydrated versions can
//! add hooks without breaking it.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use dnshook_deploy::{run_deployment, DeployConfig, ShellRunner};
use dnshook_dns::ChallengeOrchestrator;

use crate::config::HookConfig;

/// One `deploy_challenge` triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChallenge {
    pub domain: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOperation {
    /// Several challenges when dehydrated runs with `HOOK_CHAIN=yes`
    DeployChallenge(Vec<PendingChallenge>),
    CleanChallenge(Vec<String>),
    DeployCert {
        domain: String,
        privkey: PathBuf,
        cert: PathBuf,
        fullchain: PathBuf,
    },
    UnchangedCert {
        domain: String,
    },
    InvalidChallenge {
        domain: String,
        response: String,
    },
    RequestFailure {
        status: String,
        reason: String,
        request_type: String,
    },
    StartupHook,
    ExitHook,
    Unknown(String),
}

impl HookOperation {
    pub fn parse(operation: &str, args: &[String]) -> Result<Self> {
        let op = match operation {
            "deploy_challenge" => {
                if args.is_empty() || args.len() % 3 != 0 {
                    bail!("deploy_challenge expects <domain> <token_filename> <token> (repeated)");
                }
                HookOperation::DeployChallenge(
                    args.chunks(3)
                        .map(|triple| PendingChallenge {
                            domain: triple[0].clone(),
                            token: triple[2].clone(),
                        })
                        .collect(),
                )
            }
            "clean_challenge" => {
                if args.is_empty() {
                    bail!("clean_challenge expects <domain> [<token_filename> <token>]");
                }
                HookOperation::CleanChallenge(args.iter().step_by(3).cloned().collect())
            }
            "deploy_cert" => match args {
                [domain, privkey, cert, fullchain, ..] => HookOperation::DeployCert {
                    domain: domain.clone(),
                    privkey: PathBuf::from(privkey),
                    cert: PathBuf::from(cert),
                    fullchain: PathBuf::from(fullchain),
                },
                _ => bail!("deploy_cert expects <domain> <privkey> <cert> <fullchain>"),
            },
            "unchanged_cert" => match args {
                [domain, ..] => HookOperation::UnchangedCert {
                    domain: domain.clone(),
                },
                _ => bail!("unchanged_cert expects <domain>"),
            },
            "invalid_challenge" => match args {
                [domain, response, ..] => HookOperation::InvalidChallenge {
                    domain: domain.clone(),
                    response: response.clone(),
                },
                _ => bail!("invalid_challenge expects <domain> <response>"),
            },
            "request_failure" => {
                let arg = |i: usize| args.get(i).cloned().unwrap_or_default();
                HookOperation::RequestFailure {
                    status: arg(0),
                    reason: arg(1),
                    request_type: arg(2),
                }
            }
            "startup_hook" => HookOperation::StartupHook,
            "exit_hook" => HookOperation::ExitHook,
            other => HookOperation::Unknown(other.to_string()),
        };
        Ok(op)
    }

    pub fn name(&self) -> &str {
        match self {
            HookOperation::DeployChallenge(_) => "deploy_challenge",
            HookOperation::CleanChallenge(_) => "clean_challenge",
            HookOperation::DeployCert { .. } => "deploy_cert",
            HookOperation::UnchangedCert { .. } => "unchanged_cert",
            HookOperation::InvalidChallenge { .. } => "invalid_challenge",
            HookOperation::RequestFailure { .. } => "request_failure",
            HookOperation::StartupHook => "startup_hook",
            HookOperation::ExitHook => "exit_hook",
            HookOperation::Unknown(name) => name,
        }
    }
}

/// Carry out one hook operation
pub async fn run_hook(operation: HookOperation, config: &HookConfig) -> Result<()> {
    if !matches!(operation, HookOperation::Unknown(_)) {
        tracing::info!("Dreamhost hook executing: {}", operation.name());
    }

    match operation {
        HookOperation::DeployChallenge(challenges) => {
            deploy_challenges(&config.orchestrator()?, &challenges).await?;
        }
        HookOperation::CleanChallenge(domains) => {
            clean_challenges(&config.orchestrator()?, &domains).await?;
        }
        HookOperation::DeployCert {
            domain,
            privkey,
            cert,
            fullchain,
        } => {
            tracing::info!("New certificate for {}", domain);
            tracing::info!("Private Key: {}", privkey.display());
            tracing::info!("Certificate: {}", cert.display());
            tracing::info!("Full Chain: {}", fullchain.display());

            let path = DeployConfig::resolve_path(config.deploy_config.clone());
            tracing::info!("Using deployment config file {}", path.display());
            let deploy_config = DeployConfig::load(&path)?;
            run_deployment(&deploy_config, &ShellRunner).context("Deployment failed")?;
        }
        HookOperation::UnchangedCert { domain } => {
            tracing::info!("Existing cert for '{}' is unchanged. Skipping hook!", domain);
        }
        HookOperation::InvalidChallenge { domain, response } => {
            tracing::warn!("Invalid challenge for '{}'", domain);
            tracing::warn!("Full error: '{}'", response);
        }
        HookOperation::RequestFailure {
            status,
            reason,
            request_type,
        } => {
            tracing::error!(
                "ACME {} request failed with status {}: {}",
                request_type,
                status,
                reason
            );
        }
        HookOperation::StartupHook | HookOperation::ExitHook => {}
        HookOperation::Unknown(name) => {
            tracing::debug!("Ignoring unknown hook operation {}", name);
        }
    }

    Ok(())
}

/// One challenge after the other; the first failure ends the run
async fn deploy_challenges(
    orchestrator: &ChallengeOrchestrator,
    challenges: &[PendingChallenge],
) -> Result<()> {
    for challenge in challenges {
        orchestrator
            .deploy_challenge(&challenge.domain, &challenge.token)
            .await
            .with_context(|| format!("Failed to deploy challenge for {}", challenge.domain))?;
    }
    Ok(())
}

async fn clean_challenges(orchestrator: &ChallengeOrchestrator, domains: &[String]) -> Result<()> {
    for domain in domains {
        orchestrator
            .clean_challenge(domain)
            .await
            .with_context(|| format!("Failed to clean challenge for {}", domain))?;
    }
    Ok(())
}
