use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

pub mod commands;

/// Absolute project root for a `--root` argument.
///
/// Existing directories are canonicalized; a root that does not exist yet
/// (`init-project`) is joined onto the working directory as given.
pub fn resolve_root(root: &str) -> Result<PathBuf> {
    let cwd = env::current_dir().context("Failed to get current directory")?;
    let path = cwd.join(root);
    Ok(path.canonicalize().unwrap_or(path))
}

/// Project name used when `init-project` is not given one: the root's last
/// component, or `tagfix-project` for a filesystem root.
pub fn default_project_name(root: &Path) -> String {
    root.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "tagfix-project".to_string())
}

/// Hex SHA-256 of a snapshot file.
///
/// Recorded with every cache operation and shown by `status`, so a history
/// entry can be matched against the snapshot currently on disk.
pub fn snapshot_fingerprint(path: &Path) -> Result<String> {
    let body = fs::read(path)
        .with_context(|| format!("Failed to read snapshot for hashing: {}", path.display()))?;
    Ok(format!("{:x}", Sha256::digest(&body)))
}

/// Like [`snapshot_fingerprint`], but a failure only logs a warning.
pub fn try_snapshot_fingerprint(path: &Path) -> Option<String> {
    match snapshot_fingerprint(path) {
        Ok(hash) => Some(hash),
        Err(err) => {
            log::warn!("{err:#}");
            None
        }
    }
}
