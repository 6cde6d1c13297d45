//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$SHELFWORK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/shelfwork/config.toml`
//! 3. `~/.shelfwork/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use shelfwork::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("Store: {}", config.store_path().unwrap().display());
//! println!("Long press: {:?}", config.long_press());
//! ```

pub mod schema;

pub use schema::{FileConfig, LoadConfig, SessionConfig, StoreConfig, ViewConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::types::Level;

/// Default long-press hold time.
pub const DEFAULT_LONG_PRESS_MS: u64 = 300;

/// Default number of empty slots shown above an uncapped column.
pub const DEFAULT_PADDING: usize = 1;

/// Default deepest layer loaded when opening a warehouse.
pub const DEFAULT_OPEN_DEPTH: Level = Level::Shelf;

/// Keys accepted by [`Config::get`] and [`Config::set`].
pub const CONFIG_KEYS: [&str; 5] = [
    "store.path",
    "view.long_press_ms",
    "view.default_padding",
    "load.open_depth",
    "session.user",
];

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown config key: {0}")]
    UnknownKey(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Resolved configuration.
///
/// Accessor methods apply defaults for anything the file leaves unset.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Values read from the config file
    pub file: FileConfig,
    /// Path the file was loaded from (if any)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    /// A missing config file is not an error (defaults are used).
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    fn find_config_file() -> Option<PathBuf> {
        // 1. Check $SHELFWORK_CONFIG
        if let Ok(path) = std::env::var("SHELFWORK_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/shelfwork/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("shelfwork/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.shelfwork/config.toml
        let path = dirs::home_dir()?.join(".shelfwork/config.toml");
        path.exists().then_some(path)
    }

    /// Path the configuration was loaded from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get the canonical config path, `~/.shelfwork/config.toml`.
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".shelfwork/config.toml"))
    }

    /// Location of the JSON document store.
    ///
    /// Defaults to `~/.shelfwork/store.json`.
    pub fn store_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = self.file.store.as_ref().and_then(|s| s.path.clone()) {
            return Ok(path);
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".shelfwork/store.json"))
    }

    pub fn long_press(&self) -> Duration {
        let ms = self
            .file
            .view
            .as_ref()
            .and_then(|v| v.long_press_ms)
            .unwrap_or(DEFAULT_LONG_PRESS_MS);
        Duration::from_millis(ms)
    }

    pub fn default_padding(&self) -> usize {
        self.file
            .view
            .as_ref()
            .and_then(|v| v.default_padding)
            .unwrap_or(DEFAULT_PADDING)
    }

    pub fn open_depth(&self) -> Level {
        self.file
            .load
            .as_ref()
            .and_then(|l| l.open_depth)
            .unwrap_or(DEFAULT_OPEN_DEPTH)
    }

    /// Name recorded as tray `blame`; falls back to `$USER`.
    pub fn user(&self) -> String {
        self.file
            .session
            .as_ref()
            .and_then(|s| s.user.clone())
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Read a single value by dotted key. `None` when unset.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let file = &self.file;
        let value = match key {
            "store.path" => file
                .store
                .as_ref()
                .and_then(|s| s.path.as_ref())
                .map(|p| p.display().to_string()),
            "view.long_press_ms" => file
                .view
                .as_ref()
                .and_then(|v| v.long_press_ms)
                .map(|v| v.to_string()),
            "view.default_padding" => file
                .view
                .as_ref()
                .and_then(|v| v.default_padding)
                .map(|v| v.to_string()),
            "load.open_depth" => file
                .load
                .as_ref()
                .and_then(|l| l.open_depth)
                .map(|l| l.to_string()),
            "session.user" => file.session.as_ref().and_then(|s| s.user.clone()),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        };
        Ok(value)
    }

    /// Set a single value by dotted key, validating the result.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |e: &dyn std::fmt::Display| {
            ConfigError::InvalidValue(format!("{} = {:?}: {}", key, value, e))
        };
        let mut file = self.file.clone();
        match key {
            "store.path" => {
                file.store.get_or_insert_with(Default::default).path = Some(PathBuf::from(value));
            }
            "view.long_press_ms" => {
                let ms = value.parse::<u64>().map_err(|e| invalid(&e))?;
                file.view.get_or_insert_with(Default::default).long_press_ms = Some(ms);
            }
            "view.default_padding" => {
                let padding = value.parse::<usize>().map_err(|e| invalid(&e))?;
                file.view.get_or_insert_with(Default::default).default_padding = Some(padding);
            }
            "load.open_depth" => {
                let level = value.parse::<Level>().map_err(|e| invalid(&e))?;
                file.load.get_or_insert_with(Default::default).open_depth = Some(level);
            }
            "session.user" => {
                file.session.get_or_insert_with(Default::default).user = Some(value.to_string());
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        file.validate()?;
        self.file = file;
        Ok(())
    }

    /// Write the file config atomically to `path`.
    ///
    /// Creates parent directories if needed. Uses atomic write
    /// (write to temp file, then rename) to prevent corruption.
    pub fn write_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents = toml::to_string_pretty(&self.file)
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
