//! Environment variable backend

use std::env::{self, VarError};

use crate::error::SecretError;

/// Read the value of `var_name`
///
/// A variable holding non-UTF-8 bytes is reported as such rather than as
/// unset, so a mangled key is not mistaken for a missing one.
pub fn resolve(var_name: &str) -> Result<String, SecretError> {
    match env::var(var_name) {
        Ok(value) => Ok(value),
        Err(VarError::NotPresent) => Err(SecretError::EnvNotSet {
            var: var_name.to_string(),
        }),
        Err(VarError::NotUnicode(_)) => Err(SecretError::backend(
            "env",
            format!("{} is not valid UTF-8", var_name),
        )),
    }
}
