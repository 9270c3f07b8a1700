//! Per-call backup options and the result shape of a backup.

use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use std::fmt::Write;
use std::path::{is_separator, PathBuf};

use crate::errors::{BackupError, Result};

/// strftime pattern of the default suffix, e.g. `.backup.20240131235959`.
pub const DEFAULT_SUFFIX_FORMAT: &str = ".backup.%Y%m%d%H%M%S";

/// Options for one `backup` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupOptions {
    /// Appended to the source's file name to form the backup path.
    pub suffix: String,
    /// A missing source is a successful no-op instead of an error.
    pub skip_if_not_exist: bool,
    /// `true`: rename the source aside (it vacates its path).
    /// `false`: copy it, leaving the source in place for the caller to mutate.
    pub keep_source: bool,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            suffix: Local::now().format(DEFAULT_SUFFIX_FORMAT).to_string(),
            skip_if_not_exist: true,
            keep_source: false,
        }
    }
}

impl BackupOptions {
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_skip_if_not_exist(mut self, v: bool) -> Self {
        self.skip_if_not_exist = v;
        self
    }

    pub fn with_keep_source(mut self, v: bool) -> Self {
        self.keep_source = v;
        self
    }
}

/// Render a suffix from a strftime pattern using the local clock.
///
/// Fails with `InvalidSuffix` when the pattern has an unknown specifier or
/// renders to something that cannot be appended to a file name.
pub fn timestamp_suffix(format: &str) -> Result<String> {
    let invalid = || BackupError::InvalidSuffix {
        suffix: format.to_string(),
    };
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|i| matches!(i, Item::Error)) {
        return Err(invalid());
    }

    let mut suffix = String::new();
    write!(suffix, "{}", Local::now().format_with_items(items.iter()))
        .map_err(|_| invalid())?;
    validate_suffix(&suffix)?;
    Ok(suffix)
}

// An empty suffix would alias the source; a separator would leave its directory.
pub(crate) fn validate_suffix(suffix: &str) -> Result<()> {
    if suffix.is_empty() || suffix.chars().any(is_separator) {
        return Err(BackupError::InvalidSuffix {
            suffix: suffix.to_string(),
        });
    }
    Ok(())
}

/// What a successful `backup` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupOutcome {
    /// Where the backup lives; `None` when nothing was backed up.
    pub backup_path: Option<PathBuf>,
    /// `false` only when the source was missing and skipping was allowed.
    pub performed: bool,
}

impl BackupOutcome {
    pub(crate) fn skipped() -> Self {
        Self {
            backup_path: None,
            performed: false,
        }
    }

    pub(crate) fn performed(backup_path: PathBuf) -> Self {
        Self {
            backup_path: Some(backup_path),
            performed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_skip_missing_and_copy() {
        let opts = BackupOptions::default();
        assert!(opts.skip_if_not_exist);
        assert!(!opts.keep_source);
        assert!(opts.suffix.starts_with(".backup."));
        assert_eq!(opts.suffix.len(), ".backup.".len() + 14);
    }

    #[test]
    fn timestamp_suffix_renders_pattern() {
        let suffix = timestamp_suffix(".snap.%Y%m%d").unwrap();
        assert!(suffix.starts_with(".snap."));
        assert_eq!(suffix.len(), ".snap.".len() + 8);
        assert_eq!(timestamp_suffix(".bak").unwrap(), ".bak");
    }

    #[test]
    fn timestamp_suffix_rejects_unusable_patterns() {
        // Unknown specifier, dangling '%', and a date that renders with slashes.
        for pattern in [".bak.%Q", ".bak.%", ".bak.%D", ""] {
            let err = timestamp_suffix(pattern).unwrap_err();
            assert_eq!(err.code(), "invalid_suffix", "pattern {pattern:?}");
        }
    }

    #[test]
    fn builders_override_fields() {
        let opts = BackupOptions::default()
            .with_suffix(".bak")
            .with_skip_if_not_exist(false)
            .with_keep_source(true);
        assert_eq!(opts.suffix, ".bak");
        assert!(!opts.skip_if_not_exist);
        assert!(opts.keep_source);
    }
}
