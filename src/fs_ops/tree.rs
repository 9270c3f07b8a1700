//! Concurrent directory-tree copy.
//!
//! Walks `src` depth-first on the calling thread. Subdirectories are copied
//! synchronously, one after another; the plain files of each directory form a
//! fan-out group whose copies run on a bounded rayon pool. A directory's own
//! metadata is applied only after all of its children finished successfully,
//! so completion is bottom-up while creation is top-down.
//!
//! Cancellation is cooperative: once a task in a group fails, tasks of that
//! group that have not started yet return `Cancelled` without touching the
//! disk. The process-wide flag in `crate::shutdown` is honoured the same way.
//! Running copies are never interrupted, and every group is joined before its
//! directory call returns.
//!
//! On error the destination is left partially copied; callers must discard it.

use rayon::{Scope, ThreadPool, ThreadPoolBuilder};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

use super::copy::copy_file;
use super::metadata::preserve_metadata;
use super::util::{path_exists, remove_all};
use crate::errors::{BackupError, Result};
use crate::shutdown;

/// Copy the directory `src` to `dst` with at most `concurrency` files in flight.
/// `0` uses rayon's global pool (sized to the available parallelism).
///
/// One pool is shared by every directory level of this call, so nested fan-out
/// groups never add up to more than `concurrency` simultaneous copies.
pub fn copy_tree(src: &Path, dst: &Path, concurrency: usize) -> Result<()> {
    let pool = build_pool(concurrency);
    copy_dir(src, dst, pool.as_ref())
}

fn build_pool(concurrency: usize) -> Option<ThreadPool> {
    if concurrency == 0 {
        return None;
    }
    match ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .thread_name(|i| format!("backup-copy-{i}"))
        .build()
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            warn!(concurrency, error = %e, "failed to build copy pool; using global pool");
            None
        }
    }
}

/// State shared by the tasks of one directory's fan-out group.
#[derive(Default)]
struct FanOut {
    cancelled: AtomicBool,
    first_error: Mutex<Option<BackupError>>,
}

impl FanOut {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire) || shutdown::is_requested()
    }

    /// Record `err` unless an earlier one is already held, then cancel the group.
    fn fail(&self, err: BackupError) {
        let mut slot = self.first_error.lock().unwrap_or_else(|p| p.into_inner());
        if slot.is_none() {
            *slot = Some(err);
        }
        self.cancelled.store(true, Ordering::Release);
    }

    fn run(&self, task: impl FnOnce() -> Result<()>) {
        if self.is_cancelled() {
            self.fail(BackupError::Cancelled);
            return;
        }
        if let Err(e) = task() {
            self.fail(e);
        }
    }

    fn into_first_error(self) -> Option<BackupError> {
        self.first_error
            .into_inner()
            .unwrap_or_else(|p| p.into_inner())
    }
}

fn copy_dir(src: &Path, dst: &Path, pool: Option<&ThreadPool>) -> Result<()> {
    let src_meta = fs::metadata(src).map_err(|source| BackupError::FileStatFailed {
        path: src.to_path_buf(),
        source,
    })?;
    if !src_meta.is_dir() {
        return Err(BackupError::DirectoryReadFailed {
            path: src.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    if path_exists(dst) {
        remove_all(dst)?;
    }
    create_dir(dst, &src_meta)?;

    let entries = read_entries(src)?;
    let group = FanOut::default();
    match pool {
        Some(p) => p.in_place_scope(|s| fan_out(s, src, dst, &entries, &group, pool)),
        None => rayon::in_place_scope(|s| fan_out(s, src, dst, &entries, &group, pool)),
    }

    if let Some(first) = group.into_first_error() {
        return Err(BackupError::ConcurrentCopyFailed {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            source: Box::new(first),
        });
    }

    preserve_metadata(&src_meta, dst)?;
    debug!(src = %src.display(), dst = %dst.display(), entries = entries.len(), "copied directory");
    Ok(())
}

/// Walk one directory level: recurse into subdirectories in order, submit
/// every other entry as a file-copy task of `group`.
fn fan_out<'scope>(
    scope: &Scope<'scope>,
    src: &Path,
    dst: &Path,
    entries: &[(PathBuf, bool)],
    group: &'scope FanOut,
    pool: Option<&ThreadPool>,
) {
    for (name, is_dir) in entries {
        let child_src = src.join(name);
        let child_dst = dst.join(name);
        if *is_dir {
            if let Err(e) = copy_dir(&child_src, &child_dst, pool) {
                group.fail(e);
                break;
            }
        } else {
            if group.is_cancelled() {
                group.fail(BackupError::Cancelled);
                break;
            }
            scope.spawn(move |_| group.run(|| copy_file(&child_src, &child_dst)));
        }
    }
}

/// Immediate children of `dir`, sorted by name, tagged with "is a directory".
/// Symlinks are not directories here; the file copier follows them.
fn read_entries(dir: &Path) -> Result<Vec<(PathBuf, bool)>> {
    let read_err = |source| BackupError::DirectoryReadFailed {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let is_dir = entry.file_type().map_err(read_err)?.is_dir();
        entries.push((PathBuf::from(entry.file_name()), is_dir));
    }
    entries.sort();
    Ok(entries)
}

// The directory stays owner-writable while it is being filled; the final
// metadata pass sets the source's exact bits.
fn create_dir(dst: &Path, src_meta: &fs::Metadata) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
        builder.mode((src_meta.permissions().mode() & 0o777) | 0o700);
    }
    #[cfg(not(unix))]
    let _ = src_meta;
    builder
        .create(dst)
        .map_err(|source| BackupError::DirectoryCreateFailed {
            path: dst.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn fan_out_keeps_first_error_and_cancels() {
        let group = FanOut::default();
        group.run(|| Err(BackupError::SourceNotFound(PathBuf::from("first"))));
        let mut ran = false;
        group.run(|| {
            ran = true;
            Ok(())
        });
        assert!(!ran, "tasks started after a failure must be skipped");
        match group.into_first_error() {
            Some(BackupError::SourceNotFound(p)) => assert_eq!(p, PathBuf::from("first")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn entries_are_sorted_and_typed() {
        let td = tempdir().unwrap();
        fs::write(td.path().join("b.txt"), b"b").unwrap();
        fs::create_dir(td.path().join("a_dir")).unwrap();
        fs::write(td.path().join("c.txt"), b"c").unwrap();

        let entries = read_entries(td.path()).unwrap();
        assert_eq!(
            entries,
            vec![
                (PathBuf::from("a_dir"), true),
                (PathBuf::from("b.txt"), false),
                (PathBuf::from("c.txt"), false),
            ]
        );
    }

    #[test]
    fn file_source_is_rejected_before_touching_destination() {
        let td = tempdir().unwrap();
        let src = td.path().join("plain.txt");
        fs::write(&src, b"x").unwrap();
        let dst = td.path().join("out");
        fs::write(&dst, b"keep").unwrap();

        let err = copy_tree(&src, &dst, 2).unwrap_err();
        assert_eq!(err.code(), "directory_read_failed");
        assert_eq!(fs::read(&dst).unwrap(), b"keep");
    }

    #[test]
    fn copies_empty_directory() {
        let td = tempdir().unwrap();
        let src = td.path().join("empty");
        fs::create_dir(&src).unwrap();
        let dst = td.path().join("empty.copy");

        copy_tree(&src, &dst, 1).unwrap();
        assert!(dst.is_dir());
        assert_eq!(fs::read_dir(&dst).unwrap().count(), 0);
    }
}
