use std::path::PathBuf;
use std::process::Command;

use crate::config::DeployConfig;
use crate::error::DeployError;
use crate::swap::deploy_file;

/// How one post-deployment action ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Succeeded,
    /// Ran, but exited non-zero (`None` when killed by a signal)
    Failed { code: Option<i32> },
    /// Could not be started at all
    LaunchError(String),
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Succeeded)
    }
}

/// Runs post-deployment actions
pub trait ActionRunner {
    fn run(&self, action: &str) -> ActionOutcome;
}

/// Runs each action through `sh -c` and waits for it to exit
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl ActionRunner for ShellRunner {
    fn run(&self, action: &str) -> ActionOutcome {
        match Command::new("sh").arg("-c").arg(action).status() {
            Ok(status) if status.success() => ActionOutcome::Succeeded,
            Ok(status) => ActionOutcome::Failed {
                code: status.code(),
            },
            Err(e) => ActionOutcome::LaunchError(e.to_string()),
        }
    }
}

/// A live file that received new content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedFile {
    pub domain: String,
    pub file_type: String,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub struct DeploymentReport {
    pub deployed: Vec<DeployedFile>,
    /// Every action that ran, in order, with its outcome
    pub actions: Vec<(String, ActionOutcome)>,
}

impl DeploymentReport {
    pub fn any_changed(&self) -> bool {
        !self.deployed.is_empty()
    }
}

/// Deploy every configured file, then run post actions if anything changed
///
/// A missing live or issued file stops the run immediately. Action failures
/// are logged and recorded, and never stop the remaining actions.
pub fn run_deployment(
    config: &DeployConfig,
    runner: &dyn ActionRunner,
) -> Result<DeploymentReport, DeployError> {
    tracing::info!("Starting new file deployment");
    let mut report = DeploymentReport::default();

    for (domain, locations) in &config.domains {
        tracing::info!("Deploying new files for: {}", domain);

        for location in locations {
            for pair in config.pairs(domain, location) {
                if !pair.new_path.exists() {
                    return Err(DeployError::FileMissing {
                        description: format!("new {}", pair.file_type),
                        path: pair.new_path,
                    });
                }
                if !pair.old_path.exists() {
                    return Err(DeployError::FileMissing {
                        description: format!("old {}", pair.file_type),
                        path: pair.old_path,
                    });
                }

                if deploy_file(&pair.file_type, &pair.old_path, &pair.new_path)? {
                    report.deployed.push(DeployedFile {
                        domain: domain.clone(),
                        file_type: pair.file_type,
                        path: pair.old_path,
                    });
                }
            }
        }
    }

    if report.any_changed() {
        tracing::info!("Starting post-deployment actions");
        for action in &config.post_actions {
            tracing::info!("Attempting action: {}", action);
            let outcome = runner.run(action);
            match &outcome {
                ActionOutcome::Succeeded => tracing::info!("Action exited with status 0"),
                ActionOutcome::Failed { code: Some(code) } => {
                    tracing::error!("Action '{}' exited with status {}", action, code)
                }
                ActionOutcome::Failed { code: None } => {
                    tracing::error!("Action '{}' was terminated by a signal", action)
                }
                ActionOutcome::LaunchError(e) => {
                    tracing::error!("Action '{}' could not be started: {}", action, e)
                }
            }
            report.actions.push((action.clone(), outcome));
        }
    } else {
        tracing::info!("No files changed, skipping post-deployment actions");
    }

    tracing::info!("New file deployment done.");
    Ok(report)
}
