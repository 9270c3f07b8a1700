//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Unknown elements are an error so misconfigurations surface early.
//! - Missing elements keep their `Config::default()` values.

use anyhow::{bail, Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::paths::{default_config_path, CONFIG_ENV};
use crate::config::types::{Config, LogLevel};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    #[serde(rename = "suffix_format")]
    suffix_format: Option<String>,
    #[serde(rename = "skip_if_not_exist", default, deserialize_with = "de_bool_trimmed_opt")]
    skip_if_not_exist: Option<bool>,
    #[serde(rename = "keep_source", default, deserialize_with = "de_bool_trimmed_opt")]
    keep_source: Option<bool>,
    #[serde(rename = "concurrency", default, deserialize_with = "de_usize_trimmed_opt")]
    concurrency: Option<usize>,
    #[serde(rename = "log_level")]
    log_level: Option<String>,
    #[serde(rename = "log_file")]
    log_file: Option<String>,
}

fn de_bool_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<bool>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected true or false, got '{s}'"))),
    }
}

fn de_usize_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<usize>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected a count, got '{s}'"))),
    }
}

// Map XmlConfig -> Config, keeping defaults for absent or blank elements.
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(s) = parsed.suffix_format.as_deref() {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            cfg.suffix_format = trimmed.to_string();
        }
    }
    if let Some(v) = parsed.skip_if_not_exist {
        cfg.skip_if_not_exist = v;
    }
    if let Some(v) = parsed.keep_source {
        cfg.keep_source = v;
    }
    if let Some(n) = parsed.concurrency {
        cfg.concurrency = n;
    }
    if let Some(s) = parsed.log_level.as_deref() {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            cfg.log_level = trimmed.parse::<LogLevel>().map_err(anyhow::Error::msg)?;
        }
    }
    if let Some(s) = parsed.log_file.as_deref() {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            cfg.log_file = Some(PathBuf::from(trimmed));
        }
    }

    Ok(cfg)
}

/// Load and validate a Config from a specific XML file.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    let cfg = xml_to_config(parsed)
        .with_context(|| format!("invalid value in config xml '{}'", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config xml '{}'", path.display()))?;
    Ok(cfg)
}

/// Resolve and load the effective Config.
///
/// `$BACKUP_GUARD_CONFIG` must point at an existing file when set. Without it,
/// a missing platform config file means `Config::default()`.
pub fn load_config() -> Result<Config> {
    let explicit = env::var_os(CONFIG_ENV).is_some_and(|p| !p.is_empty());
    let Some(path) = default_config_path() else {
        debug!("no config directory available; using defaults");
        return Ok(Config::default());
    };

    if !path.exists() {
        if explicit {
            bail!(
                "{CONFIG_ENV} points to '{}', which does not exist",
                path.display()
            );
        }
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(Config::default());
    }

    debug!(path = %path.display(), "loading config");
    load_config_from_xml_path(&path)
}
