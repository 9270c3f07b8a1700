//! Default config path resolution.

use dirs::config_dir;
use std::env;
use std::path::PathBuf;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "BACKUP_GUARD_CONFIG";

/// `$BACKUP_GUARD_CONFIG` if set and non-empty, else the OS config dir
/// (`<config_dir>/backup_guard/config.xml`), else `~/.config/...`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(p));
    }
    if let Some(mut base) = config_dir() {
        base.push("backup_guard");
        base.push("config.xml");
        Some(base)
    } else {
        env::var("HOME").ok().map(|h| {
            PathBuf::from(h)
                .join(".config")
                .join("backup_guard")
                .join("config.xml")
        })
    }
}
