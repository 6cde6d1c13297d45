//! core::config::schema
//!
//! Configuration schema types.
//!
//! Located at (in order of precedence):
//! 1. `$SHELFWORK_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/shelfwork/config.toml`
//! 3. `~/.shelfwork/config.toml` (canonical write location)
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected ranges (e.g., the long-press delay must be non-zero).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::Level;

/// Longest long-press delay accepted, in milliseconds.
const MAX_LONG_PRESS_MS: u64 = 10_000;

/// File configuration.
///
/// # Example
///
/// ```toml
/// [store]
/// path = "/var/lib/shelfwork/store.json"
///
/// [view]
/// long_press_ms = 300
/// default_padding = 1
///
/// [load]
/// open_depth = "shelf"
///
/// [session]
/// user = "volunteer-3"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Document store settings
    pub store: Option<StoreConfig>,

    /// Shelf view settings
    pub view: Option<ViewConfig>,

    /// Partial-load settings
    pub load: Option<LoadConfig>,

    /// Session identity
    pub session: Option<SessionConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(view) = &self.view {
            view.validate()?;
        }
        if let Some(load) = &self.load {
            load.validate()?;
        }
        if let Some(session) = &self.session {
            if let Some(user) = &session.user {
                if user.trim().is_empty() {
                    return Err(ConfigError::InvalidValue(
                        "session.user cannot be blank".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Path of the JSON document store file.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    /// Hold time before a press becomes a drag-select.
    pub long_press_ms: Option<u64>,

    /// Empty slots shown above an uncapped column.
    pub default_padding: Option<usize>,
}

impl ViewConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ms) = self.long_press_ms {
            if ms == 0 || ms > MAX_LONG_PRESS_MS {
                return Err(ConfigError::InvalidValue(format!(
                    "view.long_press_ms must be between 1 and {}, got {}",
                    MAX_LONG_PRESS_MS, ms
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Deepest layer loaded when a warehouse is opened.
    pub open_depth: Option<Level>,
}

impl LoadConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.open_depth == Some(Level::Warehouse) {
            return Err(ConfigError::InvalidValue(
                "load.open_depth must be below warehouse".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Name recorded as `blame` on edited trays.
    pub user: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let toml = r#"
            [store]
            path = "/tmp/store.json"

            [view]
            long_press_ms = 250
            default_padding = 2

            [load]
            open_depth = "column"

            [session]
            user = "alice"
        "#;
        let config: FileConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.store.unwrap().path,
            Some(PathBuf::from("/tmp/store.json"))
        );
        let view = config.view.unwrap();
        assert_eq!(view.long_press_ms, Some(250));
        assert_eq!(view.default_padding, Some(2));
        assert_eq!(config.load.unwrap().open_depth, Some(Level::Column));
        assert_eq!(config.session.unwrap().user.as_deref(), Some("alice"));
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: Result<FileConfig, _> = toml::from_str("colour = \"red\"");
        assert!(result.is_err());
    }

    #[test]
    fn validates_long_press() {
        let config = FileConfig {
            view: Some(ViewConfig {
                long_press_ms: Some(0),
                default_padding: None,
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validates_open_depth() {
        let config = FileConfig {
            load: Some(LoadConfig {
                open_depth: Some(Level::Warehouse),
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validates_blank_user() {
        let config = FileConfig {
            session: Some(SessionConfig {
                user: Some("  ".into()),
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
