//! Metadata preservation.
//! - Copies the modification time, then the permission bits, from already-fetched
//!   source metadata onto a destination path.
//! - Strict: any failure is returned as `MetadataApplyFailed`; a copy whose
//!   metadata could not be applied is not reported as done.
//! - Must only run after the destination content is complete.

use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::Path;
use tracing::trace;

use crate::errors::{BackupError, Result};

/// Preserve metadata on `dest` using already-fetched `src_meta`.
/// Callers pass src metadata to avoid re-statting the source repeatedly.
pub fn preserve_metadata(src_meta: &fs::Metadata, dest: &Path) -> Result<()> {
    let mtime = FileTime::from_last_modification_time(src_meta);
    set_file_mtime(dest, mtime).map_err(|source| BackupError::MetadataApplyFailed {
        path: dest.to_path_buf(),
        source,
    })?;
    trace!(path = %dest.display(), "set mtime on destination");

    apply_permissions(src_meta, dest)
}

#[cfg(unix)]
fn apply_permissions(src_meta: &fs::Metadata, dest: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let src_mode = src_meta.permissions().mode() & 0o777;
    fs::set_permissions(dest, fs::Permissions::from_mode(src_mode)).map_err(|source| {
        BackupError::MetadataApplyFailed {
            path: dest.to_path_buf(),
            source,
        }
    })?;
    trace!(path = %dest.display(), mode = format!("{:o}", src_mode), "set permissions on destination");
    Ok(())
}

// Windows: mirror the readonly attribute, the only permission bit there is.
#[cfg(not(unix))]
fn apply_permissions(src_meta: &fs::Metadata, dest: &Path) -> Result<()> {
    let ro = src_meta.permissions().readonly();
    let map = |source| BackupError::MetadataApplyFailed {
        path: dest.to_path_buf(),
        source,
    };
    let mut perms = fs::metadata(dest).map_err(map)?.permissions();
    perms.set_readonly(ro);
    fs::set_permissions(dest, perms).map_err(map)?;
    trace!(path = %dest.display(), readonly = ro, "set readonly attribute on destination");
    Ok(())
}
