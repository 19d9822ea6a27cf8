//! User preferences
//!
//! Loaded once at startup, saved on explicit request. Stored as pretty JSON
//! in `~/.lifeos/preferences.json` unless `LIFEOS_PREFERENCES_PATH` points
//! elsewhere.

use crate::aggregates::format_money;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

const PREF_FILE: &str = "preferences.json";

/// Environment variable overriding the preferences file location
pub const PREFERENCES_PATH_ENV: &str = "LIFEOS_PREFERENCES_PATH";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot determine home directory")]
    NoHomeDirectory,

    #[error("Failed to access preferences at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse preferences at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize preferences: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// User preferences
///
/// All fields use `#[serde(default)]` so files written by older versions
/// still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Theme id
    #[serde(default = "default_theme")]
    pub theme: String,

    #[serde(default = "default_username")]
    pub username: String,

    /// ISO currency code used by money formatting
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_bible_version")]
    pub bible_version: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            username: default_username(),
            currency: default_currency(),
            bible_version: default_bible_version(),
        }
    }
}

fn default_theme() -> String {
    "COSMIC".to_string()
}

fn default_username() -> String {
    "Rudolf".to_string()
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_bible_version() -> String {
    "ls1910".to_string()
}

impl Preferences {
    /// Format an amount in the preferred currency (`1 234,56 €`)
    pub fn format_money(&self, amount: f64) -> String {
        format_money(amount, &self.currency)
    }

    /// Load from `path`, or defaults when the file does not exist
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        if !fs::try_exists(path)
            .await
            .map_err(|e| ConfigError::io(path, e))?
        {
            tracing::debug!("No preferences at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::io(path, e))?;

        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save to `path`, creating parent directories
    ///
    /// Writes to a temporary file then renames it over the target, so a
    /// crash never leaves a truncated file behind.
    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::io(parent, e))?;
        }

        let serialized = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        fs::write(&temp_path, serialized)
            .await
            .map_err(|e| ConfigError::io(&temp_path, e))?;
        fs::rename(&temp_path, path)
            .await
            .map_err(|e| ConfigError::io(path, e))?;

        tracing::info!("Saved preferences to {}", path.display());
        Ok(())
    }
}

/// Location of the preferences file
///
/// `LIFEOS_PREFERENCES_PATH` wins; otherwise `~/.lifeos/preferences.json`.
pub fn default_preferences_path() -> Result<PathBuf, ConfigError> {
    if let Ok(env_path) = std::env::var(PREFERENCES_PATH_ENV) {
        tracing::info!("Using preferences path from {}: {}", PREFERENCES_PATH_ENV, env_path);
        return Ok(PathBuf::from(env_path));
    }

    let home_dir = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(home_dir.join(".lifeos").join(PREF_FILE))
}
