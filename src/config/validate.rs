//! Config validation logic.

use anyhow::{bail, Context, Result};
use std::path::is_separator;
use tracing::debug;

use super::types::Config;
use crate::backup::timestamp_suffix;

impl Config {
    /// Reject settings that could not produce a usable backup path.
    pub fn validate(&self) -> Result<()> {
        if self.suffix_format.trim().is_empty() {
            bail!("suffix_format must not be empty");
        }
        if self.suffix_format.chars().any(is_separator) {
            bail!(
                "suffix_format '{}' must not contain a path separator",
                self.suffix_format
            );
        }
        // Unknown specifiers, or ones like %D that expand to slashes.
        timestamp_suffix(&self.suffix_format).with_context(|| {
            format!("suffix_format '{}' does not render to a usable suffix", self.suffix_format)
        })?;
        debug!(
            suffix_format = %self.suffix_format,
            concurrency = self.concurrency,
            log_level = %self.log_level,
            "config validated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn separators_and_blanks_are_rejected() {
        for bad in ["", "   ", "/.bak", ".bak/%Y", ".bak.%Q", ".bak.%D", ".bak.%"] {
            let cfg = Config {
                suffix_format: bad.into(),
                ..Default::default()
            };
            assert!(cfg.validate().is_err(), "{bad:?} should be rejected");
        }
    }
}
