use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dnshook_deploy::{run_deployment, DeployConfig, ShellRunner};

/// Deploy freshly issued certificates to their live locations
#[derive(Parser, Debug)]
#[command(name = "dnshook-deploy")]
#[command(about = "Swap issued certificates into place and run post-deployment actions")]
struct Args {
    /// Path to the deployment config (default: ~/.config/dnshook/deploy.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("dnshook_deploy=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let path = DeployConfig::resolve_path(args.config);
    tracing::info!("Using deployment config file {}", path.display());

    let config = DeployConfig::load(&path)?;
    let report = run_deployment(&config, &ShellRunner).context("Deployment failed")?;

    tracing::info!(
        "{} file(s) deployed, {} action(s) run",
        report.deployed.len(),
        report.actions.len()
    );
    Ok(())
}
