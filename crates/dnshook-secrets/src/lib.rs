//! Credential references and their resolution
//!
//! The registrar API key reaches the hook through the environment, but the
//! value itself may point somewhere else:
//!
//! - **Environment variables** (`env://VAR_NAME`): read from another variable
//! - **Files** (`file:///path` or just `/path`): read content from the filesystem
//! - **Base64** (`base64://...`): decode an inline value
//! - **Plain values**: any string without a URI scheme is the secret itself
//!
//! # Example
//!
//! ```rust,ignore
//! use dnshook_secrets::{SecretResolver, SecretUri};
//!
//! let uri: SecretUri = "file:///etc/dnshook/api-key".parse()?;
//! let key = SecretResolver::new().resolve_trimmed(&uri)?;
//! ```
//!
//! # Features
//!
//! - `env` (default): environment variable references
//! - `file` (default): file references
//! - `base64` (default): inline base64 values

mod backends;
mod error;
mod resolver;
mod uri;

pub use error::SecretError;
pub use resolver::SecretResolver;
pub use uri::SecretUri;
