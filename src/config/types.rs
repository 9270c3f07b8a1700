//! Core configuration types.
//! - Config holds the defaults applied to backups made from configuration.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::backup::{timestamp_suffix, BackupOptions, LocalBackuper, DEFAULT_SUFFIX_FORMAT};

/// Program-defined verbosity levels exposed to config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Completed backups and restores (default)
    #[default]
    Normal,
    /// Per-directory and per-file steps
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// strftime pattern rendered into the backup suffix at call time
    pub suffix_format: String,
    /// Treat a missing source as a no-op
    pub skip_if_not_exist: bool,
    /// Rename the source aside instead of copying it
    pub keep_source: bool,
    /// Max concurrent file copies per tree copy (0 = available parallelism)
    pub concurrency: usize,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            suffix_format: DEFAULT_SUFFIX_FORMAT.to_string(),
            skip_if_not_exist: true,
            keep_source: false,
            concurrency: 0,
            log_level: LogLevel::Normal,
            log_file: None,
        }
    }
}

impl Config {
    /// Options for one backup; the suffix is rendered from the local clock now.
    pub fn backup_options(&self) -> crate::errors::Result<BackupOptions> {
        Ok(BackupOptions {
            suffix: timestamp_suffix(&self.suffix_format)?,
            skip_if_not_exist: self.skip_if_not_exist,
            keep_source: self.keep_source,
        })
    }

    pub fn local_backuper(&self) -> LocalBackuper {
        LocalBackuper::with_concurrency(self.concurrency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_config() {
        let cfg = Config {
            suffix_format: ".bak".into(),
            keep_source: true,
            concurrency: 3,
            ..Default::default()
        };
        let opts = cfg.backup_options().unwrap();
        assert_eq!(opts.suffix, ".bak");
        assert!(opts.keep_source);
        assert!(opts.skip_if_not_exist);
        assert_eq!(cfg.local_backuper().concurrency, 3);
    }

    #[test]
    fn literal_text_in_pattern_is_kept() {
        let cfg = Config {
            suffix_format: ".old.%Y".into(),
            ..Default::default()
        };
        let suffix = cfg.backup_options().unwrap().suffix;
        assert!(suffix.starts_with(".old."));
        assert_eq!(suffix.len(), ".old.".len() + 4);
    }

    #[test]
    fn unusable_pattern_is_an_error_not_a_panic() {
        for pattern in [".bak.%Q", ".bak.%D"] {
            let cfg = Config {
                suffix_format: pattern.into(),
                ..Default::default()
            };
            let err = cfg.backup_options().unwrap_err();
            assert_eq!(err.code(), "invalid_suffix", "{pattern}");
        }
    }
}
