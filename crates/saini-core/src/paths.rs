//! Path resolution utilities.

use crate::env;
use crate::error::ConfigError;
use std::path::PathBuf;

/// Get the Saini base directory (`$SAINI_HOME`, or `~/.saini`).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    if let Some(home) = env::get_var(env::vars::SAINI_HOME) {
        return Ok(expand_tilde(&home));
    }
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".saini"))
}

/// Get the main config file path (~/.saini/saini.json5).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("saini.json5"))
}

/// Get the data directory (~/.saini/data).
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("data"))
}

/// Default location of the JSON memory store.
pub fn memory_file() -> Result<PathBuf, ConfigError> {
    Ok(data_dir()?.join("memories.json"))
}

/// Default location of the SQLite memory database.
pub fn memory_db() -> Result<PathBuf, ConfigError> {
    Ok(data_dir()?.join("memories.db"))
}

/// Default location of the check-in history file.
pub fn checkins_file() -> Result<PathBuf, ConfigError> {
    Ok(data_dir()?.join("checkins.json"))
}

/// Ensure all required directories exist.
pub fn ensure_dirs() -> Result<(), ConfigError> {
    for dir in [base_dir()?, data_dir()?] {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
