//! Runtime configuration for hosts opening the store.
//!
//! # Invariants
//! - Every field has a usable default; environment overrides are optional.
//! - Blank or invalid overrides are ignored in favor of the default.

use crate::logging::{default_log_level, normalize_level};
use crate::store::DEFAULT_STORAGE_KEY;
use std::path::{Path, PathBuf};

const DEFAULT_DB_FILE_NAME: &str = "techtrack.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "techtrack-logs";

pub const DB_PATH_ENV: &str = "TECHTRACK_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "TECHTRACK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "TECHTRACK_LOG_DIR";

/// Where durable state lives and how verbose logging is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// SQLite file backing the key-value storage.
    pub db_path: PathBuf,
    /// Key holding the serialized record array.
    pub storage_key: String,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: &'static str,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            log_level: default_log_level(),
            log_dir: std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME),
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by `TECHTRACK_DB_PATH`, `TECHTRACK_LOG_LEVEL`
    /// and `TECHTRACK_LOG_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(DB_PATH_ENV) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                config.db_path = PathBuf::from(trimmed);
            }
        }

        if let Some(level) = lookup(LOG_LEVEL_ENV).and_then(|raw| normalize_level(&raw).ok()) {
            config.log_level = level;
        }

        if let Some(raw) = lookup(LOG_DIR_ENV) {
            let path = Path::new(raw.trim());
            if path.is_absolute() {
                config.log_dir = path.to_path_buf();
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::path::PathBuf;

    #[test]
    fn overrides_apply_when_valid() {
        let config = StoreConfig::from_lookup(|name| match name {
            DB_PATH_ENV => Some(" /data/tracker.db ".to_string()),
            LOG_LEVEL_ENV => Some("WARNING".to_string()),
            LOG_DIR_ENV => Some("/var/log/techtrack".to_string()),
            _ => None,
        });
        assert_eq!(config.db_path, PathBuf::from("/data/tracker.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, PathBuf::from("/var/log/techtrack"));
        assert_eq!(config.storage_key, "technologies");
    }

    #[test]
    fn blank_or_invalid_overrides_keep_defaults() {
        let config = StoreConfig::from_lookup(|name| match name {
            DB_PATH_ENV => Some("   ".to_string()),
            LOG_LEVEL_ENV => Some("loud".to_string()),
            LOG_DIR_ENV => Some("relative/logs".to_string()),
            _ => None,
        });
        assert_eq!(config, StoreConfig::default());
    }
}
