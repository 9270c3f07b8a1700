//! Backup engine, its options, and the local-filesystem backend.

mod engine;
mod local;
mod options;

pub use engine::{backup, backup_path_for, Backuper};
pub use local::{local_backup, LocalBackuper};
pub use options::{timestamp_suffix, BackupOptions, BackupOutcome, DEFAULT_SUFFIX_FORMAT};
