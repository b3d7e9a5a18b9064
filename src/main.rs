//! Melodeck - headless session runner
//!
//! Loads the user's settings and preferences, catalogs the configured
//! library directories and reports what a session would show.

use std::sync::Arc;

use {
    anyhow::Result,
    tracing::{info, warn},
    tracing_subscriber::EnvFilter,
};

use melodeck::{
    AppState, MemoryEngine, SettingsManager,
    config::{FilePreferenceStore, get_data_dir},
    error::ResultExt,
    library::DirectoryCatalogSource,
};

/// Main entry point for the Melodeck session runner.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings_manager = SettingsManager::new().add_context("Failed to load settings")?;
    let settings = settings_manager.get_settings().clone();
    if settings.library_directories.is_empty() {
        warn!(
            config = %settings_manager.get_config_path().display(),
            "No library directories configured"
        );
    }

    let data_dir = get_data_dir();
    let store = Arc::new(
        FilePreferenceStore::open(&data_dir)
            .add_contextf(format!("Failed to open preferences in {}", data_dir.display()))?,
    );
    let source = Arc::new(DirectoryCatalogSource::from_settings(&settings));
    let mut state = AppState::new(Ok(MemoryEngine::new()), store, source, &settings);

    state.load_catalog();
    while state.is_catalog_pending() {
        state.handle_next().await;
    }
    state.process_pending();

    info!(
        songs = state.catalog().len(),
        visible = state.projection().len(),
        playlists = state.playlists().len(),
        sort = state.view().sort.label(),
        theme = %state.theme(),
        "Session ready"
    );
    for track in state.projection().iter().take(20) {
        info!("{} - {} ({})", track.artist, track.title, track.album);
    }

    state.shutdown();
    Ok(())
}
