//! Backup-and-replace of a single live file
//!
//! The new content is staged in a temp file next to the live one, given the
//! live file's ownership and permissions, and renamed over it. The live path
//! always holds either the old or the new content, never nothing.

use std::ffi::OsString;
use std::fs::{self, Metadata};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};

use crate::error::DeployError;

/// `<old_path>.bak`
pub fn backup_path(old_path: &Path) -> PathBuf {
    let mut path = OsString::from(old_path.as_os_str());
    path.push(".bak");
    PathBuf::from(path)
}

/// Replace `old_path` with the content of `new_path` if they differ
///
/// Returns `Ok(false)` without touching either file when the contents are
/// identical. Otherwise the previous content is kept at
/// [`backup_path`]`(old_path)` and `Ok(true)` is returned.
pub fn deploy_file(file_type: &str, old_path: &Path, new_path: &Path) -> Result<bool, DeployError> {
    let new_content = fs::read(new_path).map_err(|e| DeployError::io(new_path, e))?;
    let old_content = fs::read(old_path).map_err(|e| DeployError::io(old_path, e))?;

    if old_content == new_content {
        tracing::warn!(
            "{} matches new {}, skipping deployment",
            old_path.display(),
            file_type
        );
        return Ok(false);
    }

    let metadata = fs::metadata(old_path).map_err(|e| DeployError::io(old_path, e))?;

    let staged = stage(old_path, &new_content, &metadata)?;
    backup(old_path, &metadata)?;

    staged
        .persist(old_path)
        .map_err(|e| DeployError::io(old_path, e.error))?;

    tracing::info!(
        "Successfully deployed new {} to {}",
        file_type,
        old_path.display()
    );
    Ok(true)
}

/// Temp file in the live file's directory holding the new content
///
/// Dropped (and deleted) on any error before it is persisted.
fn stage(old_path: &Path, content: &[u8], metadata: &Metadata) -> Result<NamedTempFile, DeployError> {
    let dir = parent_dir(old_path);
    let mut staged = NamedTempFile::new_in(dir).map_err(|e| DeployError::io(dir, e))?;
    staged
        .write_all(content)
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|e| DeployError::io(staged.path(), e))?;

    apply_metadata(staged.path(), metadata).map_err(|e| DeployError::io(staged.path(), e))?;
    Ok(staged)
}

/// Keep the current live file as `.bak`, replacing an older backup
///
/// The backup is built under a temporary name and renamed into place, so an
/// older `.bak` survives any failure here.
fn backup(old_path: &Path, metadata: &Metadata) -> Result<(), DeployError> {
    let bak = backup_path(old_path);
    let dir = parent_dir(old_path);
    let mut builder = Builder::new();
    builder.prefix(".dnshook-bak");

    match builder.make_in(dir, |path| fs::hard_link(old_path, path)) {
        Ok(linked) => {
            linked
                .persist(&bak)
                .map_err(|e| DeployError::io(&bak, e.error))?;
        }
        Err(e) => {
            tracing::debug!(
                "Cannot hard link {} ({}), copying instead",
                old_path.display(),
                e
            );
            let copied = builder
                .tempfile_in(dir)
                .map_err(|e| DeployError::io(dir, e))?;
            fs::copy(old_path, copied.path()).map_err(|e| DeployError::io(old_path, e))?;
            apply_metadata(copied.path(), metadata)
                .map_err(|e| DeployError::io(copied.path(), e))?;
            copied
                .persist(&bak)
                .map_err(|e| DeployError::io(&bak, e.error))?;
        }
    }

    tracing::debug!("Backed up {} to {}", old_path.display(), bak.display());
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Ownership first: changing owners may clear setuid/setgid bits
fn apply_metadata(path: &Path, metadata: &Metadata) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        std::os::unix::fs::chown(path, Some(metadata.uid()), Some(metadata.gid()))?;
    }

    fs::set_permissions(path, metadata.permissions())
}
