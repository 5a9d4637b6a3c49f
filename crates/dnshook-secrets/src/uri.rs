use std::path::PathBuf;
use std::str::FromStr;

use crate::error::SecretError;

/// A credential reference that can be resolved from one of several backends.
///
/// Supported forms:
/// - `env://VAR_NAME` - Environment variable
/// - `file:///path/to/file` or an absolute/relative path - File content
/// - `base64://...` - Inline base64-encoded value
/// - Plain string - Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum SecretUri {
    /// Plain text value (no URI scheme)
    Plain(String),

    /// Environment variable: `env://VAR_NAME`
    Env { var_name: String },

    /// File path: `file:///path/to/file` or just a path
    File { path: PathBuf },

    /// Inline base64: `base64://SGVsbG8=`
    Base64 { data: String },
}

impl SecretUri {
    /// Get the backend name for logging/errors
    pub fn backend_name(&self) -> &'static str {
        match self {
            SecretUri::Plain(_) => "plain",
            SecretUri::Env { .. } => "env",
            SecretUri::File { .. } => "file",
            SecretUri::Base64 { .. } => "base64",
        }
    }
}

impl FromStr for SecretUri {
    type Err = SecretError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(var_name) = s.strip_prefix("env://") {
            if var_name.is_empty() {
                return Err(SecretError::invalid_uri(
                    s,
                    "env URI must specify a variable name",
                ));
            }
            Ok(SecretUri::Env {
                var_name: var_name.to_string(),
            })
        } else if let Some(path) = s.strip_prefix("file://") {
            if path.is_empty() {
                return Err(SecretError::invalid_uri(s, "file URI must specify a path"));
            }
            Ok(SecretUri::File {
                path: PathBuf::from(path),
            })
        } else if let Some(data) = s.strip_prefix("base64://") {
            if data.is_empty() {
                return Err(SecretError::invalid_uri(s, "base64 URI has no data"));
            }
            Ok(SecretUri::Base64 {
                data: data.to_string(),
            })
        } else if looks_like_file_path(s) {
            Ok(SecretUri::File {
                path: PathBuf::from(s),
            })
        } else {
            Ok(SecretUri::Plain(s.to_string()))
        }
    }
}

/// API keys never start with a path separator, so these are safe to treat as files
fn looks_like_file_path(s: &str) -> bool {
    s.starts_with('/') || s.starts_with("./") || s.starts_with("../")
}
