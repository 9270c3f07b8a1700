//! Local-filesystem backend.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use super::engine::{backup, Backuper};
use super::options::{BackupOptions, BackupOutcome};
use crate::errors::{BackupError, Result};
use crate::fs_ops;
use crate::rollback::Rollbacker;

/// [`Backuper`] over the local filesystem.
///
/// Directory copies fan out on a pool of `concurrency` threads (`0` = rayon's
/// global pool). Metadata (mtime, permission bits) is preserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalBackuper {
    pub concurrency: usize,
}

impl LocalBackuper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(concurrency: usize) -> Self {
        Self { concurrency }
    }
}

impl Backuper for LocalBackuper {
    fn path_exists(&self, path: &Path) -> bool {
        fs_ops::path_exists(path)
    }

    fn copy(&self, src: &Path, dst: &Path) -> Result<()> {
        let meta = fs::metadata(src).map_err(|source| BackupError::FileStatFailed {
            path: src.to_path_buf(),
            source,
        })?;
        let res = if meta.is_dir() {
            fs_ops::copy_tree(src, dst, self.concurrency)
        } else {
            fs_ops::copy_file(src, dst)
        };
        if res.is_err() && fs_ops::path_exists(dst) {
            if let Err(e) = fs_ops::remove_all(dst) {
                warn!(dst = %dst.display(), error = %e, "failed to remove partial copy");
            }
        }
        res
    }

    fn rename(&self, src: &Path, dst: &Path) -> Result<()> {
        fs_ops::try_atomic_move(src, dst)
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        fs_ops::remove_all(path)
    }
}

/// [`backup`] with a default [`LocalBackuper`].
pub fn local_backup(
    rb: Option<&mut dyn Rollbacker>,
    src: &Path,
    opts: Option<&BackupOptions>,
) -> Result<BackupOutcome> {
    backup(rb, Arc::new(LocalBackuper::new()), src, opts)
}
