//! Atomic rename helper.
//! - Performs a rename with both paths in the error.
//! - On Windows, removes an existing destination file first (RenameFile doesn’t overwrite).
//! - On Unix, best-effort fsync of the destination directory after rename.

use std::fs;
use std::path::Path;

use crate::errors::{BackupError, Result};

pub fn try_atomic_move(src: &Path, dst: &Path) -> Result<()> {
    #[cfg(windows)]
    {
        if dst.is_file() {
            if let Err(e) = fs::remove_file(dst) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(BackupError::RemoveFailed {
                        path: dst.to_path_buf(),
                        source: e,
                    });
                }
            }
        }
    }

    fs::rename(src, dst).map_err(|source| BackupError::RenameFailed {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    })?;

    // Ignore fsync errors to avoid turning a successful rename into a failure.
    #[cfg(unix)]
    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        let _ = super::util::fsync_dir(parent);
    }

    Ok(())
}
