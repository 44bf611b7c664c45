//! Registry settings persistence.
//!
//! Settings live in the platform-specific config directory unless a path is
//! given explicitly:
//! - Linux: ~/.config/varkit/settings.json
//! - macOS: ~/Library/Application Support/varkit/settings.json
//! - Windows: %APPDATA%/varkit/settings.json

use std::path::PathBuf;

use tracing::debug;
use varkit_domain::RegistrySettings;

use crate::serialization::{SerializationError, read_json_file, write_json_file};

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Reading, parsing or writing the settings file failed.
    #[error("Settings file error: {0}")]
    Serialization(#[from] SerializationError),

    /// Could not determine config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Repository for registry settings.
#[derive(Debug, Clone, Default)]
pub struct SettingsRepository {
    path: Option<PathBuf>,
}

impl SettingsRepository {
    /// Creates a repository at the default location.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository reading and writing `path`.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Returns the default settings path: `<config_dir>/varkit/settings.json`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("varkit").join("settings.json"))
    }

    /// Returns the file this repository uses, if one can be determined.
    #[must_use]
    pub fn path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(Self::default_path)
    }

    /// Loads settings. A missing file, or no config directory at all,
    /// yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<RegistrySettings, SettingsError> {
        let Some(path) = self.path() else {
            return Ok(RegistrySettings::default());
        };
        let settings = read_json_file::<RegistrySettings>(&path)?;
        if settings.is_none() {
            debug!(path = %path.display(), "no settings file, using defaults");
        }
        Ok(settings.unwrap_or_default())
    }

    /// Saves settings, creating the config directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if no path can be determined or the write fails.
    pub fn save(&self, settings: &RegistrySettings) -> Result<(), SettingsError> {
        let path = self.path().ok_or(SettingsError::NoConfigDir)?;
        write_json_file(&path, settings)?;
        Ok(())
    }
}
