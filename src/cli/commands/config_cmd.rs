//! config command - Get, set, or list configuration values

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::config::{Config, CONFIG_KEYS};
use crate::ui::output;

/// Get a configuration value. Unset keys print nothing.
pub fn get(_ctx: &Context, key: &str) -> Result<()> {
    let config = Config::load().context("Failed to load config")?;
    if let Some(value) = config.get(key)? {
        println!("{}", value);
    }
    Ok(())
}

/// Set a configuration value and write the file.
///
/// Writes back to the file the configuration came from, else to
/// `$SHELFWORK_CONFIG` if set, else to `~/.shelfwork/config.toml`.
pub fn set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load().context("Failed to load config")?;
    config.set(key, value)?;

    let path = match config.path() {
        Some(path) => path.to_path_buf(),
        None => match std::env::var_os("SHELFWORK_CONFIG") {
            Some(path) => PathBuf::from(path),
            None => Config::default_config_path()?,
        },
    };
    config
        .write_to(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    output::debug(format!("wrote {}", path.display()), ctx.verbosity());
    output::success(format!("Set {} = {}", key, value), ctx.verbosity());
    Ok(())
}

/// List every key with its effective value.
pub fn list(ctx: &Context) -> Result<()> {
    let config = Config::load().context("Failed to load config")?;

    match config.path() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# (no config file, showing defaults)"),
    }
    for key in CONFIG_KEYS {
        let value = match config.get(key)? {
            Some(value) => value,
            None => format!("{} (default)", effective_default(&config, key)),
        };
        println!("{} = {}", key, value);
    }
    output::debug(format!("user: {}", config.user()), ctx.verbosity());
    Ok(())
}

fn effective_default(config: &Config, key: &str) -> String {
    match key {
        "store.path" => config
            .store_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "(no home directory)".to_string()),
        "view.long_press_ms" => config.long_press().as_millis().to_string(),
        "view.default_padding" => config.default_padding().to_string(),
        "load.open_depth" => config.open_depth().to_string(),
        "session.user" => config.user(),
        _ => String::new(),
    }
}
