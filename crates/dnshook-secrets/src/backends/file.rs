//! Key file backend

use std::fs;
use std::path::Path;

use crate::error::SecretError;

/// Read a key file
///
/// Logs a warning when the file is readable by group or others, since it
/// holds a credential with full DNS control.
pub fn resolve(path: &Path) -> Result<String, SecretError> {
    let file_error = |e: std::io::Error| SecretError::FileError {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let metadata = fs::metadata(path).map_err(file_error)?;
    if metadata.is_dir() {
        return Err(SecretError::FileError {
            path: path.to_path_buf(),
            message: "is a directory, expected a key file".to_string(),
        });
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            tracing::warn!(
                "Key file {} is accessible by other users (mode {:o})",
                path.display(),
                mode & 0o777
            );
        }
    }

    fs::read_to_string(path).map_err(file_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_key_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "6SHU5P2HLDAYECUM").unwrap();

        let result = resolve(file.path()).unwrap();
        assert_eq!(result.trim(), "6SHU5P2HLDAYECUM");
    }

    #[test]
    fn test_missing_key_file_is_named() {
        let err = resolve(Path::new("/definitely/not/here/api-key")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here/api-key"));
    }

    #[test]
    fn test_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve(dir.path()).unwrap_err();
        assert!(err.to_string().contains("is a directory"));
    }

    #[cfg(unix)]
    #[test]
    fn test_shared_key_file_still_resolves() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "6SHU5P2HLDAYECUM").unwrap();
        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o644)).unwrap();

        assert_eq!(resolve(file.path()).unwrap(), "6SHU5P2HLDAYECUM");
    }
}
