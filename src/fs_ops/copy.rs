//! Single-file copy:
//! - Removes an existing destination first (never a partial overwrite)
//! - Streams into a hidden temp sibling created with the source's permission bits
//! - Syncs the temp file, then atomically renames it onto the destination
//! - Applies mtime and permissions only after the content is durable
//!
//! A failed copy never leaves a complete-looking destination: the temp file is
//! removed best-effort and the destination name is only bound after the sync.

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use super::atomic::try_atomic_move;
use super::metadata::preserve_metadata;
use super::util::{path_exists, remove_all, unique_temp_path};
use super::io_copy;
use crate::errors::{BackupError, Result};

pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if path_exists(dst) {
        remove_all(dst)?;
    }

    let meta = fs::metadata(src).map_err(|source| BackupError::FileStatFailed {
        path: src.to_path_buf(),
        source,
    })?;
    let mode = permission_bits(&meta);

    let tmp = unique_temp_path(dst);
    let written = io_copy::copy_streaming(src, &tmp, mode).and_then(|bytes| {
        try_atomic_move(&tmp, dst)?;
        Ok(bytes)
    });
    let bytes = match written {
        Ok(b) => b,
        Err(e) => {
            if let Err(cleanup) = remove_all(&tmp) {
                warn!(tmp = %tmp.display(), error = %cleanup, "failed to remove temporary copy");
            }
            return Err(e);
        }
    };

    preserve_metadata(&meta, dst)?;
    debug!(src = %src.display(), dst = %dst.display(), bytes, "copied file");
    Ok(())
}

#[cfg(unix)]
fn permission_bits(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn permission_bits(_meta: &fs::Metadata) -> u32 {
    0o666
}
