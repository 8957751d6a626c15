//! Snowkarma configuration sections.

use serde::{Deserialize, Serialize};

// ── Identity ────────────────────────────────────────────────────

/// Default config directory name under `$HOME`.
pub const APP_DIR_NAME: &str = ".snowkarma";

/// Environment variable that overrides `[storage].data_file`.
pub const DATA_FILE_ENV: &str = "SNOWKARMA_DATA_FILE";

pub fn default_config_path() -> String {
    format!("~/{APP_DIR_NAME}/config.toml")
}

// ── Storage ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Karma data file (tilde-expanded).
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
        }
    }
}

fn default_data_file() -> String {
    format!("~/{APP_DIR_NAME}/karma.txt")
}

// ── Access ──────────────────────────────────────────────────────

/// Authorization tiers. Names compare case-insensitively; `"*"` matches anyone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccessConfig {
    /// Bot administrators (may view the leaderboard anywhere).
    #[serde(default)]
    pub admins: Vec<String>,
    /// Trusted users (may view the leaderboard and other people's karma).
    #[serde(default)]
    pub allowlist: Vec<String>,
}

impl AccessConfig {
    pub fn is_admin(&self, name: &str) -> bool {
        list_contains(&self.admins, name)
    }

    pub fn is_allowlisted(&self, name: &str) -> bool {
        list_contains(&self.allowlist, name)
    }
}

fn list_contains(list: &[String], name: &str) -> bool {
    list.iter()
        .any(|entry| entry == "*" || entry.eq_ignore_ascii_case(name))
}

// ── Logging ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
