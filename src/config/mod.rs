//! User preferences, settings, and persistent key-value partitions.
//!
//! Settings follow the XDG Base Directory layout; small state holders
//! (theme, favorites, playlists) persist through a [`PreferenceStore`].

pub mod preferences;
pub mod settings;

pub use {
    preferences::{FilePreferenceStore, MemoryPreferenceStore, Partition, PreferenceStore},
    settings::{SettingsError, SettingsManager, UserSettings, get_config_path, get_data_dir},
};
