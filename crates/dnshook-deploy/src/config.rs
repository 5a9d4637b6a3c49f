//! Deployment configuration
//!
//! Loaded from `~/.config/dnshook/deploy.toml` unless another path is given:
//!
//! ```toml
//! certs_dir = "/etc/dehydrated/certs"
//! post_actions = ["systemctl reload nginx"]
//!
//! [[domains."example.com"]]
//! cert = "/etc/nginx/ssl/example.com/cert.pem"
//! privkey = "/etc/nginx/ssl/example.com/privkey.pem"
//! ```
//!
//! Each `[[domains."<domain>"]]` entry is one location: a mapping from file
//! type (`cert`, `privkey`, `chain`, `fullchain`, ...) to the live file that
//! should receive `<certs_dir>/<domain>/<file type>.pem`.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::DeployError;

/// Where dehydrated writes issued certificates by default
pub const DEFAULT_CERTS_DIR: &str = "/etc/dehydrated/certs";

/// Environment variable overriding the config file location
pub const DEPLOY_CONFIG_ENV: &str = "DNSHOOK_DEPLOY_CONFIG";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DeployConfig {
    /// Root of the issued certificates (`~` is expanded)
    pub certs_dir: Option<String>,

    /// Domain → locations, each mapping file type → live path
    pub domains: BTreeMap<String, Vec<BTreeMap<String, String>>>,

    /// Shell commands run after at least one file changed
    pub post_actions: Vec<String>,
}

/// One live file and the freshly issued file that replaces it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPair {
    pub file_type: String,
    pub old_path: PathBuf,
    pub new_path: PathBuf,
}

impl DeployConfig {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dnshook")
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join("deploy.toml")
    }

    /// Explicit path, then `DNSHOOK_DEPLOY_CONFIG`, then the default location
    pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(|| env::var(DEPLOY_CONFIG_ENV).ok().map(|p| expand(&p)))
            .unwrap_or_else(Self::default_path)
    }

    /// Load the config file; a missing file is an error, not an empty config
    pub fn load(path: &Path) -> Result<Self, DeployError> {
        if !path.exists() {
            return Err(DeployError::ConfigMissing {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| DeployError::io(path, e))?;
        let config = Self::parse(&content).map_err(|e| DeployError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        tracing::info!("Loaded deployment config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn certs_dir(&self) -> PathBuf {
        self.certs_dir
            .as_deref()
            .map(expand)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CERTS_DIR))
    }

    /// `<certs_dir>/<domain>/<file_type>.pem`
    pub fn issued_path(&self, domain: &str, file_type: &str) -> PathBuf {
        self.certs_dir()
            .join(domain)
            .join(format!("{}.pem", file_type))
    }

    /// Pairs of one location, in file type order
    pub fn pairs(&self, domain: &str, location: &BTreeMap<String, String>) -> Vec<DeploymentPair> {
        location
            .iter()
            .map(|(file_type, live)| DeploymentPair {
                file_type: file_type.clone(),
                old_path: expand(live),
                new_path: self.issued_path(domain, file_type),
            })
            .collect()
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
