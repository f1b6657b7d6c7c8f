//! Session artifact discovery
//!
//! A session is a `<name>.session` file in the sessions directory. Only the
//! platform adapter reads or writes its contents; this module deals in names.

use crate::error::HarvestError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File extension of session artifacts (without the dot)
pub const SESSION_EXTENSION: &str = "session";

/// Path of the artifact backing `name`
#[must_use]
pub fn session_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{SESSION_EXTENSION}"))
}

/// Check that `name` can be used as a file stem inside the sessions directory
///
/// # Errors
///
/// Returns `HarvestError::Config` for empty names, names with path separators,
/// and `.`/`..`.
pub fn validate_session_name(name: &str) -> Result<(), HarvestError> {
    if name.is_empty() {
        return Err(HarvestError::Config("session name is empty".to_string()));
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(HarvestError::Config(format!(
            "session name '{name}' is not a plain file name"
        )));
    }
    Ok(())
}

/// List session names found in `dir`, sorted
///
/// The directory is created when missing. Sub-directories and files with
/// other extensions are ignored.
///
/// # Errors
///
/// Returns `HarvestError::Io` if the directory cannot be created or read.
pub async fn enumerate_sessions(dir: &Path) -> Result<Vec<String>, HarvestError> {
    if !tokio::fs::try_exists(dir).await? {
        info!(dir = %dir.display(), "Creating sessions directory");
    }
    tokio::fs::create_dir_all(dir).await?;

    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(SESSION_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();

    debug!(dir = %dir.display(), count = names.len(), "Sessions enumerated");
    Ok(names)
}
