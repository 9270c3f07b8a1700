//! Core library for `backup_guard`.
//!
//! Transactional backups of files and directory trees: before mutating a
//! path, back it up next to itself and register how to undo the mutation and
//! how to release the backup afterwards. Running those compensations is the
//! caller's business, through any [`Rollbacker`] (see [`RollbackStack`]).
//!
//! - [`backup`]: the engine, over any [`Backuper`] storage backend.
//! - [`LocalBackuper`] / [`local_backup`]: the local-filesystem backend.
//! - [`fs_ops`]: the metadata-preserving file and concurrent tree copiers.
//! - [`config`] / [`logging`]: XML configuration and tracing set-up.

pub mod backup;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod logging;
pub mod rollback;
pub mod shutdown;

pub use backup::{
    backup, backup_path_for, local_backup, timestamp_suffix, BackupOptions, BackupOutcome,
    Backuper, LocalBackuper, DEFAULT_SUFFIX_FORMAT,
};
pub use config::{load_config, load_config_from_xml_path, Config, LogLevel};
pub use errors::{BackupError, Result};
pub use rollback::{Action, RollbackStack, Rollbacker};
