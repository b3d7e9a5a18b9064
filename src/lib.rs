//! Melodeck - offline music library player core
//!
//! A headless core for a local music player: it reads the device's audio
//! catalog, derives the visible track list from sort, filter and view-mode
//! choices, and keeps an index-addressed playback engine in step with that
//! list without interrupting the track that is playing. Favorites,
//! playlists, a sleep timer and theme selection persist across sessions.

pub mod config;
pub mod error;
pub mod library;
pub mod playback;
pub mod state;

// Re-export key types for convenience
pub use {
    config::{SettingsManager, UserSettings},
    error::{CatalogError, EngineError, PersistenceError, PlaylistError},
    library::{Catalog, Playlist, SortKey, Track, ViewMode, ViewState},
    playback::{MemoryEngine, PlaybackEngine, QueueBinding},
    state::{AppState, AppStateEvent, ThemeType},
};
