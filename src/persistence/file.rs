//! Snapshot file I/O.
//!
//! Writes go to a sibling temp file that is synced and then renamed over the
//! target, so a crash mid-write leaves the previous snapshot intact.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::PersistenceError;

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("snapshot"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Atomically replaces `path` with `bytes`, creating parent directories.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| PersistenceError::io(parent, e))?;
    }

    let tmp = temp_path(path);
    let mut file = fs::File::create(&tmp)
        .await
        .map_err(|e| PersistenceError::io(&tmp, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| PersistenceError::io(&tmp, e))?;
    file.sync_all()
        .await
        .map_err(|e| PersistenceError::io(&tmp, e))?;
    drop(file);

    fs::rename(&tmp, path)
        .await
        .map_err(|e| PersistenceError::io(path, e))
}

pub(crate) async fn read(path: &Path) -> Result<Vec<u8>, PersistenceError> {
    fs::read(path)
        .await
        .map_err(|e| PersistenceError::io(path, e))
}
