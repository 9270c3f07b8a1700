//! Typed error definitions for backup_guard.
//! Every variant carries the paths involved so a failure can be diagnosed from
//! the message alone; `code()` gives a stable name for structured logs.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BackupError>;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Source path not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Invalid backup suffix {suffix:?}: must be non-empty and contain no path separator")]
    InvalidSuffix { suffix: String },

    #[error("Source path has no file name component: {0}")]
    InvalidSourcePath(PathBuf),

    #[error("Failed to remove stale backup {path}: {source}")]
    StaleBackupCleanupFailed {
        path: PathBuf,
        #[source]
        source: Box<BackupError>,
    },

    #[error("Failed to write backup '{src}' -> '{dst}': {source}")]
    BackupWriteFailed {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: Box<BackupError>,
    },

    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read directory {path}: {source}")]
    DirectoryReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to stat {path}: {source}")]
    FileStatFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to open {path}: {source}")]
    FileOpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{src}' -> '{dst}': {source}")]
    FileWriteFailed {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to apply metadata to {path}: {source}")]
    MetadataApplyFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Concurrent copy of '{src}' -> '{dst}' failed: {source}")]
    ConcurrentCopyFailed {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: Box<BackupError>,
    },

    #[error("Failed to remove {path}: {source}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to rename '{src}' -> '{dst}': {source}")]
    RenameFailed {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to restore '{src}' from backup '{backup}': {source}")]
    RestoreFailed {
        src: PathBuf,
        backup: PathBuf,
        #[source]
        source: Box<BackupError>,
    },

    #[error("Failed to clean up backup {path}: {source}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: Box<BackupError>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BackupError {
    /// Stable identifier for the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            BackupError::SourceNotFound(_) => "source_not_found",
            BackupError::InvalidSuffix { .. } => "invalid_suffix",
            BackupError::InvalidSourcePath(_) => "invalid_source_path",
            BackupError::StaleBackupCleanupFailed { .. } => "stale_backup_cleanup_failed",
            BackupError::BackupWriteFailed { .. } => "backup_write_failed",
            BackupError::DirectoryCreateFailed { .. } => "directory_create_failed",
            BackupError::DirectoryReadFailed { .. } => "directory_read_failed",
            BackupError::FileStatFailed { .. } => "file_stat_failed",
            BackupError::FileOpenFailed { .. } => "file_open_failed",
            BackupError::FileWriteFailed { .. } => "file_write_failed",
            BackupError::MetadataApplyFailed { .. } => "metadata_apply_failed",
            BackupError::ConcurrentCopyFailed { .. } => "concurrent_copy_failed",
            BackupError::RemoveFailed { .. } => "remove_failed",
            BackupError::RenameFailed { .. } => "rename_failed",
            BackupError::RestoreFailed { .. } => "restore_failed",
            BackupError::CleanupFailed { .. } => "cleanup_failed",
            BackupError::Cancelled => "cancelled",
            BackupError::Other(_) => "other",
        }
    }

    /// True when the error, or anything it wraps, is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            BackupError::Cancelled => true,
            BackupError::StaleBackupCleanupFailed { source, .. }
            | BackupError::BackupWriteFailed { source, .. }
            | BackupError::ConcurrentCopyFailed { source, .. }
            | BackupError::RestoreFailed { source, .. }
            | BackupError::CleanupFailed { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}
