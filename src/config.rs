//! Configuration for hammerspace

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HammerspaceError, Result};

/// Default storage directory
pub fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hammerspace")
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the SQLite database
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Database file name inside `storage_dir`
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Owner of the seeded template collections
    #[serde(default = "default_template_username")]
    pub template_username: String,

    /// Page size used by listings when the caller gives none
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Upper bound on any requested page size
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_database_file() -> String {
    "hammerspace.db".to_string()
}

fn default_template_username() -> String {
    "template_user".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_max_page_size() -> u32 {
    500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            database_file: default_database_file(),
            template_username: default_template_username(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| HammerspaceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| HammerspaceError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create the storage directory and write this config there if none exists.
    /// Returns `true` when the config file was written.
    pub fn init_storage(&self) -> Result<bool> {
        std::fs::create_dir_all(&self.storage_dir)?;
        let path = self.config_path();
        if path.exists() {
            return Ok(false);
        }
        self.save(&path)?;
        Ok(true)
    }

    /// Reject settings that would make listings or seeding misbehave
    pub fn validate(&self) -> Result<()> {
        if self.database_file.trim().is_empty() {
            return Err(HammerspaceError::Config("database_file must not be empty".into()));
        }
        if self.template_username.trim().is_empty() {
            return Err(HammerspaceError::Config(
                "template_username must not be empty".into(),
            ));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(HammerspaceError::Config(format!(
                "default_page_size must be between 1 and max_page_size ({})",
                self.max_page_size
            )));
        }
        Ok(())
    }

    /// Clamp a caller-provided page size to the configured bounds
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        match requested {
            Some(0) | None => self.default_page_size,
            Some(n) => n.min(self.max_page_size),
        }
    }

    /// Get database file path
    pub fn database_path(&self) -> PathBuf {
        self.storage_dir.join(&self.database_file)
    }

    /// Get config file path
    pub fn config_path(&self) -> PathBuf {
        self.storage_dir.join("config.toml")
    }
}
