//! Backup engine.
//!
//! Orchestrates one backup: validate, check the source, clear a stale backup,
//! move or copy the source aside, then register compensations. The storage
//! backend is any [`Backuper`]; the undo stack is any [`Rollbacker`].
//!
//! Ordering:
//! - nothing touches the filesystem before the source existence check passes;
//! - the stale backup is removed before the new one is written (never merged);
//! - compensations are registered only once the backup itself succeeded.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::options::{validate_suffix, BackupOptions, BackupOutcome};
use crate::errors::{BackupError, Result};
use crate::rollback::Rollbacker;

/// Storage capabilities the engine relies on.
pub trait Backuper: Send + Sync {
    /// Whether anything (file or directory) exists at `path`.
    fn path_exists(&self, path: &Path) -> bool;

    /// Duplicate a file or directory tree.
    fn copy(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Move a file or directory.
    fn rename(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Recursively delete a file or directory.
    fn remove_all(&self, path: &Path) -> Result<()>;
}

/// Back up `src` next to itself and register how to undo and release it.
///
/// - `rb`: where compensations go; `None` performs the backup without registering.
/// - `opts`: `None` means [`BackupOptions::default`].
///
/// Returns `performed == false` (and no backup path) when the source is
/// missing and `skip_if_not_exist` is set.
pub fn backup(
    rb: Option<&mut dyn Rollbacker>,
    backuper: Arc<dyn Backuper>,
    src: &Path,
    opts: Option<&BackupOptions>,
) -> Result<BackupOutcome> {
    let defaults;
    let opts = match opts {
        Some(o) => o,
        None => {
            defaults = BackupOptions::default();
            &defaults
        }
    };
    validate_suffix(&opts.suffix)?;
    let backup_path = backup_path_for(src, &opts.suffix)?;

    if !backuper.path_exists(src) {
        if opts.skip_if_not_exist {
            debug!(src = %src.display(), "source missing; nothing to back up");
            return Ok(BackupOutcome::skipped());
        }
        return Err(BackupError::SourceNotFound(src.to_path_buf()));
    }

    if backuper.path_exists(&backup_path) {
        backuper
            .remove_all(&backup_path)
            .map_err(|e| BackupError::StaleBackupCleanupFailed {
                path: backup_path.clone(),
                source: Box::new(e),
            })?;
        debug!(backup = %backup_path.display(), "removed stale backup");
    }

    let written = if opts.keep_source {
        backuper.rename(src, &backup_path)
    } else {
        backuper.copy(src, &backup_path)
    };
    written.map_err(|e| BackupError::BackupWriteFailed {
        src: src.to_path_buf(),
        dst: backup_path.clone(),
        source: Box::new(e),
    })?;

    if let Some(rb) = rb {
        register_compensations(rb, &backuper, src, &backup_path, opts.keep_source);
    }

    info!(
        src = %src.display(),
        backup = %backup_path.display(),
        keep_source = opts.keep_source,
        "backup created"
    );
    Ok(BackupOutcome::performed(backup_path))
}

/// `dirname(src)/basename(src) + suffix`.
pub fn backup_path_for(src: &Path, suffix: &str) -> Result<PathBuf> {
    let name = src
        .file_name()
        .ok_or_else(|| BackupError::InvalidSourcePath(src.to_path_buf()))?;
    let mut backup_name = name.to_os_string();
    backup_name.push(suffix);
    Ok(src.with_file_name(backup_name))
}

fn register_compensations(
    rb: &mut dyn Rollbacker,
    backuper: &Arc<dyn Backuper>,
    src: &Path,
    backup_path: &Path,
    keep_source: bool,
) {
    if !keep_source {
        let b = Arc::clone(backuper);
        let src = src.to_path_buf();
        let backup = backup_path.to_path_buf();
        rb.push_front(Box::new(move || restore(b.as_ref(), &src, &backup)));
    }

    let b = Arc::clone(backuper);
    let backup = backup_path.to_path_buf();
    rb.push_defer(Box::new(move || release(b.as_ref(), &backup)));
}

/// Undo: drop whatever is at `src` now and move the backup back.
fn restore(b: &dyn Backuper, src: &Path, backup: &Path) -> Result<()> {
    let wrap = |e: BackupError| BackupError::RestoreFailed {
        src: src.to_path_buf(),
        backup: backup.to_path_buf(),
        source: Box::new(e),
    };
    if b.path_exists(src) {
        b.remove_all(src).map_err(wrap)?;
    }
    b.rename(backup, src).map_err(wrap)?;
    info!(src = %src.display(), backup = %backup.display(), "restored source from backup");
    Ok(())
}

/// Deferred: delete the backup if it is still there.
fn release(b: &dyn Backuper, backup: &Path) -> Result<()> {
    if !b.path_exists(backup) {
        return Ok(());
    }
    b.remove_all(backup)
        .map_err(|e| BackupError::CleanupFailed {
            path: backup.to_path_buf(),
            source: Box::new(e),
        })?;
    debug!(backup = %backup.display(), "removed backup");
    Ok(())
}
