use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a deployment run
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Could not locate deployment config file: {}", path.display())]
    ConfigMissing { path: PathBuf },

    #[error("Invalid deployment config {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// A live or freshly issued file that should exist does not
    #[error("Could not locate {description} file: {}", path.display())]
    FileMissing { description: String, path: PathBuf },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeployError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
