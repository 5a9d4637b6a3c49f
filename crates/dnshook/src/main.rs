use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod config;
mod hook;

use config::HookConfig;
use hook::{run_hook, HookOperation};

/// dehydrated hook for DNS-01 challenges on Dreamhost-hosted zones
#[derive(Parser, Debug)]
#[command(name = "dnshook")]
#[command(about = "Publish ACME DNS-01 challenges through the Dreamhost API and deploy issued certificates")]
struct Cli {
    /// Deployment config used by deploy_cert (overrides DNSHOOK_DEPLOY_CONFIG)
    #[arg(long)]
    deploy_config: Option<PathBuf>,

    /// Hook operation name passed by dehydrated
    operation: String,

    /// Operation arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout belongs to dehydrated
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("dnshook=info".parse()?)
                .add_directive("dnshook_dns=info".parse()?)
                .add_directive("dnshook_deploy=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match HookConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    if cli.deploy_config.is_some() {
        config.deploy_config = cli.deploy_config;
    }

    let operation = HookOperation::parse(&cli.operation, &cli.args)?;
    run_hook(operation, &config).await
}
