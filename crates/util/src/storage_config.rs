//! Storage location and record lifetime settings.
//!
//! Resolved once at start-up from the environment, falling back to the
//! platform configuration directory (`~/.config/swatch/records.json` on most
//! platforms).

use std::env;
use std::path::PathBuf;

use dirs_next::{config_dir, home_dir};
use tracing::warn;

use crate::record_store::DEFAULT_EXPIRY_DAYS;

/// Environment variable overriding the record file location.
pub const STORE_PATH_ENV: &str = "SWATCH_STORE_PATH";

/// Environment variable overriding the record lifetime in days.
pub const EXPIRY_DAYS_ENV: &str = "SWATCH_RECORD_EXPIRY_DAYS";

/// Default filename for the record file.
pub const STORE_FILE_NAME: &str = "records.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub path: PathBuf,
    pub expiry_days: u32,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            path: default_store_path(),
            expiry_days: expiry_days_from_env(),
        }
    }
}

/// Expand a leading `~` (either separator style) to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let home = || home_dir().unwrap_or_else(|| PathBuf::from("~"));
    if trimmed == "~" {
        return home();
    }
    match trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
        Some(rest) => home().join(rest),
        None => PathBuf::from(trimmed),
    }
}

fn default_store_path() -> PathBuf {
    if let Ok(path) = env::var(STORE_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("swatch")
        .join(STORE_FILE_NAME)
}

fn expiry_days_from_env() -> u32 {
    let Ok(raw) = env::var(EXPIRY_DAYS_ENV) else {
        return DEFAULT_EXPIRY_DAYS;
    };
    match raw.trim().parse::<u32>() {
        Ok(days) if days > 0 => days,
        _ => {
            warn!(env = EXPIRY_DAYS_ENV, value = %raw, "Ignoring invalid record expiry; using default");
            DEFAULT_EXPIRY_DAYS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_override_honors_tilde() {
        let override_path = "~/custom/records.json";
        temp_env::with_var(STORE_PATH_ENV, Some(override_path), || {
            let config = StorageConfig::from_env();
            assert_eq!(config.path, expand_tilde(override_path));
            assert!(config.path.ends_with("custom/records.json"));
        });
    }

    #[test]
    fn blank_override_falls_back_to_config_dir() {
        temp_env::with_var(STORE_PATH_ENV, Some("   "), || {
            let config = StorageConfig::from_env();
            assert!(config.path.ends_with("swatch/records.json"));
        });
    }

    #[test]
    fn expiry_override_is_validated() {
        temp_env::with_var(EXPIRY_DAYS_ENV, Some("30"), || {
            assert_eq!(StorageConfig::from_env().expiry_days, 30);
        });
        temp_env::with_var(EXPIRY_DAYS_ENV, Some("0"), || {
            assert_eq!(StorageConfig::from_env().expiry_days, DEFAULT_EXPIRY_DAYS);
        });
        temp_env::with_var(EXPIRY_DAYS_ENV, Some("forever"), || {
            assert_eq!(StorageConfig::from_env().expiry_days, DEFAULT_EXPIRY_DAYS);
        });
        temp_env::with_var_unset(EXPIRY_DAYS_ENV, || {
            assert_eq!(StorageConfig::from_env().expiry_days, DEFAULT_EXPIRY_DAYS);
        });
    }

    #[test]
    fn non_tilde_paths_are_trimmed_only() {
        assert_eq!(expand_tilde(" /tmp/records.json "), PathBuf::from("/tmp/records.json"));
    }
}
