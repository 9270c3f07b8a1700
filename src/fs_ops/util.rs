use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::{BackupError, Result};

/// Existence check used before every destructive step.
/// - Empty path: `false` without touching the filesystem.
/// - Only `NotFound` means absent; any other stat error (permission denied,
///   I/O error) is reported as existing so an inaccessible path is never
///   treated as free to overwrite.
pub fn path_exists(path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        return false;
    }
    match fs::metadata(path) {
        Ok(_) => true,
        Err(e) => e.kind() != io::ErrorKind::NotFound,
    }
}

/// Remove a file or a whole directory tree. A missing path is not an error.
pub fn remove_all(path: &Path) -> Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(source) => {
            return Err(BackupError::RemoveFailed {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let res = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match res {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(BackupError::RemoveFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Hidden sibling of `dst` used while its content is being written.
/// Format: ".backup_guard.<pid>.<nanos>.<seq>.tmp"; the length does not
/// depend on `dst`'s name, so any valid destination name gets a valid temp name.
pub(super) fn unique_temp_path(dst: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    dst.with_file_name(format!(".backup_guard.{}.{}.{}.tmp", pid, nanos, seq))
}

#[cfg(unix)]
pub(super) fn fsync_dir(dir: &Path) -> io::Result<()> {
    let f = fs::File::open(dir)?;
    f.sync_all()
}

#[cfg(not(unix))]
pub(super) fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
