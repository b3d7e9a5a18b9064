//! User preference management with XDG Base Directory compliance.
//!
//! This module provides user settings management with proper XDG directory
//! usage for the settings file and the preference partitions.

use std::{
    env::var,
    fs::{create_dir_all, read_to_string, write},
    io::Error as StdError,
    path::PathBuf,
};

use {
    parking_lot::{RwLock, RwLockReadGuard},
    serde::{Deserialize, Serialize},
    serde_json::{Error as SerdeJsonError, from_str, to_string_pretty},
    thiserror::Error,
    tracing::debug,
};

use crate::library::projection::SortKey;

/// Application directory name under the XDG roots.
const APP_DIR: &str = "melodeck";

/// Error type for settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to read or write settings file.
    #[error("IO error: {0}")]
    IoError(#[from] StdError),
    /// Failed to serialize or deserialize settings.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] SerdeJsonError),
    /// Invalid settings value.
    #[error("Invalid settings value: {reason}")]
    InvalidValue { reason: String },
}

/// Serializable user settings structure with default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// Directories walked by the directory catalog source.
    pub library_directories: Vec<String>,
    /// Whether hidden files and directories are catalogued.
    pub include_hidden: bool,
    /// Sort key applied when a session starts.
    pub default_sort: SortKey,
    /// Sleep timer durations offered to the user, in minutes.
    pub sleep_timer_presets_minutes: Vec<u32>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            library_directories: vec![],
            include_hidden: false,
            default_sort: SortKey::Title,
            sleep_timer_presets_minutes: vec![15, 30, 45, 60],
        }
    }
}

impl UserSettings {
    /// Checks that the settings can drive a session.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidValue` when a sleep timer preset is zero.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.sleep_timer_presets_minutes.contains(&0) {
            return Err(SettingsError::InvalidValue {
                reason: "sleep timer presets must be at least one minute".to_string(),
            });
        }
        Ok(())
    }
}

/// Handles loading, saving, and validation of user preferences.
#[derive(Debug)]
pub struct SettingsManager {
    /// Thread-safe user settings storage.
    settings: RwLock<UserSettings>,
    /// Path to the configuration file on disk.
    config_path: PathBuf,
}

impl SettingsManager {
    /// Creates a new settings manager with default config path.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if settings cannot be loaded from disk.
    pub fn new() -> Result<Self, SettingsError> {
        Self::with_config_path(get_config_path())
    }

    /// Creates a new settings manager with a custom config path (for testing).
    ///
    /// # Arguments
    ///
    /// * `config_path` - Custom path for the settings file
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if settings cannot be loaded from disk or fail
    /// validation.
    pub fn with_config_path(config_path: PathBuf) -> Result<Self, SettingsError> {
        if let Some(parent) = config_path.parent() {
            create_dir_all(parent)?;
        }

        let settings: UserSettings = if config_path.exists() {
            debug!("Loading settings from existing file: {:?}", config_path);
            let contents = read_to_string(&config_path)?;
            from_str(&contents)?
        } else {
            debug!("Using default settings, no file at {:?}", config_path);
            UserSettings::default()
        };
        settings.validate()?;

        Ok(SettingsManager {
            settings: RwLock::new(settings),
            config_path,
        })
    }

    /// Gets the current settings.
    pub fn get_settings(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.settings.read()
    }

    /// Gets the configuration file path.
    pub fn get_config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Updates the settings and saves them to disk.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the new settings are invalid or cannot be
    /// saved to disk.
    pub fn update_settings(&self, new_settings: UserSettings) -> Result<(), SettingsError> {
        new_settings.validate()?;
        *self.settings.write() = new_settings;
        self.save_settings()
    }

    fn save_settings(&self) -> Result<(), SettingsError> {
        debug!("Saving settings to file: {:?}", self.config_path);
        let contents = to_string_pretty(&*self.settings.read())?;
        write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Path of the settings file: `$XDG_CONFIG_HOME/melodeck/settings.json`.
#[must_use]
pub fn get_config_path() -> PathBuf {
    let mut config_dir = xdg_home("XDG_CONFIG_HOME", ".config");
    config_dir.push(APP_DIR);
    config_dir.push("settings.json");
    config_dir
}

/// Directory holding the preference partitions: `$XDG_DATA_HOME/melodeck`.
#[must_use]
pub fn get_data_dir() -> PathBuf {
    let mut data_dir = xdg_home("XDG_DATA_HOME", ".local/share");
    data_dir.push(APP_DIR);
    data_dir
}

/// Resolves an XDG base directory, falling back to `$HOME/<fallback>`.
fn xdg_home(variable: &str, fallback: &str) -> PathBuf {
    if let Ok(dir) = var(variable)
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }

    if let Ok(home) = var("HOME") {
        let mut path = PathBuf::from(home);
        path.push(fallback);
        return path;
    }

    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use {
        serde_json::{from_str, to_string},
        tempfile::TempDir,
    };

    use crate::{
        config::settings::{SettingsError, SettingsManager, UserSettings},
        library::projection::SortKey,
    };

    #[test]
    fn test_user_settings_default() {
        let settings = UserSettings::default();
        assert!(settings.library_directories.is_empty());
        assert!(!settings.include_hidden);
        assert_eq!(settings.default_sort, SortKey::Title);
        assert_eq!(settings.sleep_timer_presets_minutes, vec![15, 30, 45, 60]);
    }

    #[test]
    fn test_user_settings_serialization() {
        let settings = UserSettings {
            library_directories: vec!["/music".to_string()],
            include_hidden: true,
            default_sort: SortKey::DurationDesc,
            sleep_timer_presets_minutes: vec![5, 90],
        };

        let serialized = to_string(&settings).unwrap();
        let deserialized: UserSettings = from_str(&serialized).unwrap();
        assert_eq!(settings, deserialized);
    }

    #[test]
    fn test_partial_settings_file_uses_defaults() {
        let settings: UserSettings = from_str(r#"{"include_hidden": true}"#).unwrap();
        assert!(settings.include_hidden);
        assert_eq!(settings.sleep_timer_presets_minutes, vec![15, 30, 45, 60]);
    }

    #[test]
    fn test_settings_round_trip_through_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.json");

        let manager = SettingsManager::with_config_path(path.clone()).unwrap();
        let mut settings = manager.get_settings().clone();
        settings.library_directories.push("/srv/music".to_string());
        manager.update_settings(settings).unwrap();

        let reopened = SettingsManager::with_config_path(path).unwrap();
        assert_eq!(
            reopened.get_settings().library_directories,
            vec!["/srv/music".to_string()]
        );
    }

    #[test]
    fn test_zero_minute_preset_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        write(&path, r#"{"sleep_timer_presets_minutes": [0, 15]}"#).unwrap();

        let result = SettingsManager::with_config_path(path);
        assert!(matches!(result, Err(SettingsError::InvalidValue { .. })));
    }

    #[test]
    fn test_settings_error_display() {
        let invalid_value_error = SettingsError::InvalidValue {
            reason: "test reason".to_string(),
        };
        assert_eq!(
            invalid_value_error.to_string(),
            "Invalid settings value: test reason"
        );
    }
}
