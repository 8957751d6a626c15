//! Host configuration, loaded from TOML.

pub mod schema;

use anyhow::{Context, Result};
use karma_core::KarmaConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub use schema::{
    default_config_path, AccessConfig, LoggingConfig, StorageConfig, APP_DIR_NAME, DATA_FILE_ENV,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub karma: KarmaConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load the config file at `path` (tilde-expanded). A missing file yields
    /// defaults; a file that exists but does not parse is an error.
    pub fn load_from_file(path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(path);
        let mut config = match fs::read_to_string(expanded_path.as_ref()) {
            Ok(content) => Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {path}, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read config file: {}", path))
            }
        };

        // Apply environment variable fallback for the data file
        if let Ok(data_file) = std::env::var(DATA_FILE_ENV) {
            if !data_file.trim().is_empty() {
                config.storage.data_file = data_file;
            }
        }

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML config")
    }

    pub fn validate(&self) -> Result<()> {
        let karma = &self.karma;
        if karma.max_top == 0 {
            anyhow::bail!("karma.max_top must be at least 1");
        }
        if karma.default_top == 0 || karma.default_top > karma.max_top {
            anyhow::bail!(
                "karma.default_top must be between 1 and max_top ({})",
                karma.max_top
            );
        }
        if karma.meme_prefixes.iter().any(|p| p.trim().is_empty()) {
            anyhow::bail!("karma.meme_prefixes must not contain empty entries");
        }
        if karma.control_chars.iter().any(|c| c.is_empty()) {
            anyhow::bail!("karma.control_chars must not contain empty entries");
        }
        if self.storage.data_file.trim().is_empty() {
            anyhow::bail!("storage.data_file must not be empty");
        }
        Ok(())
    }

    pub fn expand_paths(&mut self) {
        self.storage.data_file = shellexpand::tilde(&self.storage.data_file).to_string();
    }

    pub fn data_file(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage.data_file).as_ref())
    }
}
