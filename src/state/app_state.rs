//! Session controller with reactive update mechanisms.
//!
//! `AppState` is the single context object of a listening session. It owns
//! the catalog, the projection inputs, the queue binding, the engine, the
//! side collections and the sleep timer. Engine callbacks, catalog loads and
//! timer ticks all arrive on one inbound channel and are applied in order
//! through `&mut self`; observers follow along through a broadcast channel.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
    time::Duration,
};

use {
    anyhow::Error,
    async_channel::{Receiver, Sender, unbounded},
    tokio::sync::broadcast::{self, Receiver as BroadcastReceiver},
    tracing::{debug, info},
};

use crate::{
    config::{PreferenceStore, UserSettings},
    error::{CatalogError, EngineError, ErrorReporter, PlaylistError},
    library::{
        Catalog, CatalogLoader, CatalogSource, FavoritesManager, Playlist, PlaylistId,
        PlaylistManager, SortKey, Track, TrackId, ViewMode, ViewState, recompute,
    },
    playback::{EngineEvent, PlaybackEngine, QueueBinding, RepeatMode, SleepTimer},
    state::theme::{ThemeColors, ThemeManager, ThemeType},
};

/// Capacity of the observer broadcast channel.
const EVENT_CAPACITY: usize = 64;

/// Messages delivered to the controller inbox.
#[derive(Debug)]
pub enum ControllerMessage {
    /// Callback from the playback engine.
    Engine(EngineEvent),
    /// Result of a catalog load.
    CatalogLoaded {
        /// Sequence number of the request that produced it.
        sequence: u64,
        /// Loaded catalog or the reason it could not be read.
        result: Result<Catalog, CatalogError>,
    },
    /// Remaining time reported by a running sleep timer.
    SleepTimerTick {
        /// Timer generation that sent the tick.
        generation: u64,
        /// Time left.
        remaining: Duration,
    },
    /// A sleep timer ran out.
    SleepTimerExpired {
        /// Timer generation that expired.
        generation: u64,
    },
}

/// Application state change events.
#[derive(Debug, Clone, PartialEq)]
pub enum AppStateEvent {
    /// The visible track list was recomputed.
    ProjectionChanged(Vec<Track>),
    /// View mode, query or sort key changed.
    ViewChanged(ViewState),
    /// The track the engine is positioned on changed.
    CurrentTrackChanged(Option<Track>),
    /// Playback started or stopped.
    PlaybackStateChanged(bool),
    /// Sleep timer started, ticked, expired or was cancelled.
    SleepTimerChanged {
        /// Whether a countdown is running.
        active: bool,
        /// Time left, when running.
        remaining: Option<Duration>,
    },
    /// The playlist list changed.
    PlaylistsChanged,
    /// A different theme was selected.
    ThemeChanged(ThemeType),
    /// Short message for the user.
    Notice(String),
}

/// Central session controller.
///
/// The engine is optional: when it failed to initialize the controller runs
/// in degraded mode, where playback operations are no-ops and the track
/// list keeps working.
pub struct AppState<E: PlaybackEngine> {
    /// Playback engine, `None` in degraded mode or after shutdown.
    engine: Option<E>,
    /// Projection-to-queue binding.
    binding: QueueBinding,
    /// Current catalog.
    catalog: Catalog,
    /// Projection inputs.
    view: ViewState,
    /// Favorite tracks.
    favorites: FavoritesManager,
    /// User playlists.
    playlists: PlaylistManager,
    /// Theme persistence.
    themes: ThemeManager,
    /// Selected theme.
    theme: ThemeType,
    /// Sleep timer durations offered to the user, in minutes.
    sleep_presets: Vec<u32>,
    /// Sleep countdown.
    sleep_timer: SleepTimer,
    /// Generation of the running countdown; bumped on every start/cancel.
    sleep_generation: u64,
    /// Last remaining time reported by the running countdown.
    sleep_remaining: Option<Duration>,
    /// Background catalog loads.
    loader: CatalogLoader,
    /// Sequence number of the last catalog applied.
    applied_sequence: u64,
    /// Sender half handed to the engine and the timer.
    inbox_tx: Sender<ControllerMessage>,
    /// Controller inbox.
    inbox: Receiver<ControllerMessage>,
    /// Broadcast channel for state change notifications.
    state_tx: broadcast::Sender<AppStateEvent>,
}

impl<E: PlaybackEngine> Debug for AppState<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AppState")
            .field("playback_available", &self.engine.is_some())
            .field("catalog_len", &self.catalog.len())
            .field("view", &self.view)
            .field("projection_len", &self.binding.projection().len())
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}

impl<E: PlaybackEngine> AppState<E> {
    /// Creates a new controller.
    ///
    /// # Arguments
    ///
    /// * `engine` - Playback engine, or the error it failed to start with.
    /// * `store` - Preference store backing favorites, playlists and theme.
    /// * `source` - Catalog source read by `load_catalog`.
    /// * `settings` - User settings; supplies the initial sort key and the
    ///   sleep timer presets.
    ///
    /// # Returns
    ///
    /// A new `AppState` with an empty catalog. No catalog load is started.
    pub fn new(
        engine: Result<E, EngineError>,
        store: Arc<dyn PreferenceStore>,
        source: Arc<dyn CatalogSource>,
        settings: &UserSettings,
    ) -> Self {
        let (inbox_tx, inbox) = unbounded();
        let (state_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let engine = match engine {
            Ok(mut engine) => {
                let tx = inbox_tx.clone();
                engine.set_event_listener(Box::new(move |event| {
                    if let Err(e) = tx.try_send(ControllerMessage::Engine(event)) {
                        debug!("Dropping engine event, controller gone: {e}");
                    }
                }));
                Some(engine)
            }
            Err(e) => {
                ErrorReporter::degraded(&Error::new(e), "Playback disabled for this session");
                None
            }
        };

        let themes = ThemeManager::new(Arc::clone(&store));
        let theme = themes.theme();

        Self {
            engine,
            binding: QueueBinding::new(),
            catalog: Catalog::default(),
            view: ViewState {
                sort: settings.default_sort,
                ..ViewState::default()
            },
            favorites: FavoritesManager::new(Arc::clone(&store)),
            playlists: PlaylistManager::new(store),
            themes,
            theme,
            sleep_presets: settings.sleep_timer_presets_minutes.clone(),
            sleep_timer: SleepTimer::new(),
            sleep_generation: 0,
            sleep_remaining: None,
            loader: CatalogLoader::new(source, inbox_tx.clone()),
            applied_sequence: 0,
            inbox_tx,
            inbox,
            state_tx,
        }
    }

    /// Subscribes to application state changes.
    ///
    /// # Returns
    ///
    /// A broadcast receiver for state change events.
    pub fn subscribe(&self) -> BroadcastReceiver<AppStateEvent> {
        self.state_tx.subscribe()
    }

    /// Whether a playback engine is available.
    #[must_use]
    pub fn is_playback_available(&self) -> bool {
        self.engine.is_some()
    }

    /// The engine, when playback is available.
    #[must_use]
    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    /// Mutable engine access, for driving the engine directly.
    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// The visible track list.
    #[must_use]
    pub fn projection(&self) -> &[Track] {
        self.binding.projection()
    }

    /// The track the engine is positioned on.
    #[must_use]
    pub fn current_track(&self) -> Option<&Track> {
        self.binding.current_track()
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.engine.as_ref().is_some_and(|e| e.is_playing())
    }

    #[must_use]
    pub fn is_favorite(&self, id: TrackId) -> bool {
        self.favorites.is_favorite(id)
    }

    #[must_use]
    pub fn playlists(&self) -> &[Playlist] {
        self.playlists.playlists()
    }

    /// Whether a catalog load is still outstanding.
    #[must_use]
    pub fn is_catalog_pending(&self) -> bool {
        self.applied_sequence != self.loader.latest()
    }

    /// Sleep timer presets, in minutes.
    #[must_use]
    pub fn sleep_timer_presets(&self) -> &[u32] {
        &self.sleep_presets
    }

    /// Remaining time of the running sleep timer.
    #[must_use]
    pub fn sleep_timer_remaining(&self) -> Option<Duration> {
        self.sleep_remaining
    }

    #[must_use]
    pub fn theme(&self) -> ThemeType {
        self.theme
    }

    /// Palette of the selected theme.
    #[must_use]
    pub fn theme_colors(&self) -> ThemeColors {
        self.theme.colors()
    }

    // Catalog

    /// Starts a background catalog load and returns its sequence number.
    ///
    /// Any load still in flight is superseded.
    pub fn load_catalog(&mut self) -> u64 {
        self.loader.request()
    }

    /// Applies a catalog load result.
    ///
    /// Results from superseded requests are discarded. A failed load leaves
    /// an empty catalog. Returns whether the result was applied.
    pub fn apply_catalog(&mut self, sequence: u64, result: Result<Catalog, CatalogError>) -> bool {
        if !self.loader.is_current(sequence) {
            debug!(
                sequence,
                latest = self.loader.latest(),
                "Discarding superseded catalog load"
            );
            return false;
        }
        self.applied_sequence = sequence;

        self.catalog = match result {
            Ok(catalog) => catalog,
            Err(e) => {
                let error = Error::new(e).context("Failed to load music library");
                ErrorReporter::error(&error, "Catalog load");
                self.notify(ErrorReporter::to_user_message(&error));
                Catalog::default()
            }
        };

        if self.catalog.is_empty() {
            self.notify("No songs found");
        } else {
            self.notify(format!("Found {} songs", self.catalog.len()));
        }
        self.refresh();
        true
    }

    // Projection inputs

    /// Sets the sort key.
    pub fn set_sort(&mut self, sort: SortKey) {
        if self.view.sort == sort {
            return;
        }
        self.view.sort = sort;
        self.view_changed();
    }

    /// Advances to the next sort key and returns it.
    pub fn cycle_sort(&mut self) -> SortKey {
        let sort = self.view.sort.next();
        self.set_sort(sort);
        self.notify(sort.label());
        sort
    }

    /// Sets the free-text filter.
    pub fn set_query(&mut self, query: &str) {
        if self.view.query == query {
            return;
        }
        self.view.query = query.to_string();
        self.view_changed();
    }

    /// Removes the free-text filter.
    pub fn clear_query(&mut self) {
        self.set_query("");
    }

    /// Shows the whole catalog.
    pub fn show_all_tracks(&mut self) {
        self.set_mode(ViewMode::AllTracks);
    }

    /// Shows only favorites.
    pub fn show_favorites(&mut self) {
        self.set_mode(ViewMode::Favorites);
    }

    /// Shows one playlist.
    ///
    /// # Errors
    ///
    /// Returns `PlaylistError::NotFound` if no playlist has this id; the
    /// view is left unchanged.
    pub fn show_playlist(&mut self, id: PlaylistId) -> Result<(), PlaylistError> {
        if self.playlists.get(id).is_none() {
            return Err(PlaylistError::NotFound { id });
        }
        self.set_mode(ViewMode::Playlist(id));
        Ok(())
    }

    fn set_mode(&mut self, mode: ViewMode) {
        if self.view.mode == mode && self.view.query.is_empty() {
            return;
        }
        self.view.mode = mode;
        self.view.query.clear();
        self.view_changed();
    }

    fn view_changed(&mut self) {
        let _ = self
            .state_tx
            .send(AppStateEvent::ViewChanged(self.view.clone()));
        self.refresh();
    }

    /// Recomputes the projection and reconciles the engine with it.
    fn refresh(&mut self) {
        let before = self.current_id();
        let projection = recompute(
            &self.catalog,
            &self.view,
            self.favorites.favorites(),
            self.playlists.playlists(),
        );

        match self.engine.as_mut() {
            Some(engine) => {
                let outcome = self.binding.reconcile(projection, engine);
                debug!(?outcome, "Reconciled engine with projection");
            }
            None => self.binding.set_projection(projection),
        }

        let _ = self.state_tx.send(AppStateEvent::ProjectionChanged(
            self.binding.projection().to_vec(),
        ));
        self.current_changed(before);
    }

    // Playback

    /// Plays the projection entry at `index`. Returns whether playback began.
    pub fn play_at(&mut self, index: usize) -> bool {
        let before = self.current_id();
        let Some(engine) = self.engine.as_mut() else {
            debug!(index, "Playback unavailable, ignoring play_at");
            return false;
        };
        let started = self.binding.play_at(index, engine);
        self.current_changed(before);
        started
    }

    /// Pauses or resumes playback.
    pub fn toggle_play_pause(&mut self) {
        let before = self.current_id();
        if let Some(engine) = self.engine.as_mut() {
            self.binding.toggle_play_pause(engine);
        }
        self.current_changed(before);
    }

    /// Skips to the next track.
    pub fn skip_next(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            self.binding.skip_next(engine);
        }
    }

    /// Restarts the track or goes back one.
    pub fn skip_previous(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            self.binding.skip_previous(engine);
        }
    }

    /// Seeks within the current track.
    pub fn seek_to(&mut self, position_ms: u64) {
        if let Some(engine) = self.engine.as_mut() {
            self.binding.seek_to(position_ms, engine);
        }
    }

    /// Flips shuffle and returns the new state.
    pub fn toggle_shuffle(&mut self) -> bool {
        let before = self.current_id();
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        let enabled = self.binding.toggle_shuffle(engine);
        self.current_changed(before);
        self.notify(if enabled {
            "Shuffle Mode On"
        } else {
            "Shuffle Mode Off"
        });
        enabled
    }

    /// Advances the repeat mode and returns it.
    pub fn cycle_repeat(&mut self) -> RepeatMode {
        let Some(engine) = self.engine.as_mut() else {
            return RepeatMode::default();
        };
        let mode = self.binding.cycle_repeat(engine);
        self.notify(mode.label());
        mode
    }

    // Favorites and playlists

    /// Flips the favorite flag of `track_id` and returns the new flag.
    pub fn toggle_favorite(&mut self, track_id: TrackId) -> bool {
        let favorite = self.favorites.toggle(track_id);
        self.notify(if favorite {
            "Added to favorites"
        } else {
            "Removed from favorites"
        });
        if self.view.mode == ViewMode::Favorites {
            self.refresh();
        }
        favorite
    }

    /// Flips the favorite flag of the current track, if there is one.
    pub fn toggle_current_favorite(&mut self) -> Option<bool> {
        let id = self.current_id()?;
        Some(self.toggle_favorite(id))
    }

    /// Creates a playlist and shows it.
    ///
    /// # Errors
    ///
    /// Returns `PlaylistError::EmptyName` for a blank name.
    pub fn create_playlist(&mut self, name: &str) -> Result<Playlist, PlaylistError> {
        let playlist = self.playlists.create(name)?;
        self.notify(format!("Created playlist \"{}\"", playlist.name));
        let _ = self.state_tx.send(AppStateEvent::PlaylistsChanged);
        self.show_playlist(playlist.id)?;
        Ok(playlist)
    }

    /// Adds a track to a playlist.
    ///
    /// # Errors
    ///
    /// Returns `PlaylistError::NotFound` for an unknown playlist.
    pub fn add_to_playlist(
        &mut self,
        playlist_id: PlaylistId,
        track_id: TrackId,
    ) -> Result<(), PlaylistError> {
        self.playlists.add_track(playlist_id, track_id)?;
        let _ = self.state_tx.send(AppStateEvent::PlaylistsChanged);
        if let Some(playlist) = self.playlists.get(playlist_id) {
            self.notify(format!("Added to {}", playlist.name));
        }
        if self.view.mode == ViewMode::Playlist(playlist_id) {
            self.refresh();
        }
        Ok(())
    }

    /// Removes a track from a playlist, refreshing the view if it shows it.
    ///
    /// # Errors
    ///
    /// Returns `PlaylistError::NotFound` for an unknown playlist.
    pub fn remove_from_playlist(
        &mut self,
        playlist_id: PlaylistId,
        track_id: TrackId,
    ) -> Result<(), PlaylistError> {
        self.playlists.remove_track(playlist_id, track_id)?;
        let _ = self.state_tx.send(AppStateEvent::PlaylistsChanged);
        if self.view.mode == ViewMode::Playlist(playlist_id) {
            self.refresh();
        }
        Ok(())
    }

    /// Deletes a playlist. Returns whether it existed.
    ///
    /// Deleting the playlist being viewed switches back to all tracks.
    pub fn delete_playlist(&mut self, id: PlaylistId) -> bool {
        if !self.playlists.delete(id) {
            return false;
        }
        let _ = self.state_tx.send(AppStateEvent::PlaylistsChanged);
        self.notify("Playlist deleted");
        if self.view.mode == ViewMode::Playlist(id) {
            self.show_all_tracks();
        }
        true
    }

    // Sleep timer

    /// Starts a sleep timer of `minutes`, replacing any running one.
    ///
    /// Returns whether a countdown was scheduled; this needs a tokio
    /// runtime.
    pub fn start_sleep_timer(&mut self, minutes: u32) -> bool {
        self.sleep_generation += 1;
        let generation = self.sleep_generation;
        let duration = Duration::from_secs(u64::from(minutes) * 60);

        let tick_tx = self.inbox_tx.clone();
        let expire_tx = self.inbox_tx.clone();
        let started = self.sleep_timer.start(
            duration,
            move |remaining| {
                let _ = tick_tx.try_send(ControllerMessage::SleepTimerTick {
                    generation,
                    remaining,
                });
            },
            move || {
                let _ = expire_tx.try_send(ControllerMessage::SleepTimerExpired { generation });
            },
        );
        if !started {
            return false;
        }

        self.sleep_remaining = Some(duration);
        self.sleep_timer_changed();
        self.notify(format!("Sleep timer set for {minutes} minutes"));
        true
    }

    /// Cancels the running sleep timer.
    pub fn cancel_sleep_timer(&mut self) {
        if self.sleep_remaining.is_none() && !self.sleep_timer.is_active() {
            return;
        }
        self.sleep_generation += 1;
        self.sleep_timer.cancel();
        self.sleep_remaining = None;
        self.sleep_timer_changed();
        self.notify("Sleep timer cancelled");
    }

    fn sleep_timer_changed(&self) {
        let _ = self.state_tx.send(AppStateEvent::SleepTimerChanged {
            active: self.sleep_remaining.is_some(),
            remaining: self.sleep_remaining,
        });
    }

    fn on_sleep_timer_expired(&mut self) {
        self.sleep_remaining = None;
        self.sleep_timer.cancel();
        if let Some(engine) = self.engine.as_mut()
            && engine.is_playing()
        {
            engine.pause();
        }
        self.sleep_timer_changed();
        self.notify("Sleep timer ended - playback paused");
    }

    // Theme

    /// Selects and persists a theme.
    pub fn set_theme(&mut self, theme: ThemeType) {
        self.themes.save_theme(theme);
        if self.theme != theme {
            self.theme = theme;
            let _ = self.state_tx.send(AppStateEvent::ThemeChanged(theme));
        }
    }

    // Inbox

    /// Applies one inbox message.
    pub fn handle_message(&mut self, message: ControllerMessage) {
        match message {
            ControllerMessage::Engine(event) => self.on_engine_event(&event),
            ControllerMessage::CatalogLoaded { sequence, result } => {
                self.apply_catalog(sequence, result);
            }
            ControllerMessage::SleepTimerTick {
                generation,
                remaining,
            } => {
                if generation == self.sleep_generation && self.sleep_remaining.is_some() {
                    self.sleep_remaining = Some(remaining);
                    self.sleep_timer_changed();
                }
            }
            ControllerMessage::SleepTimerExpired { generation } => {
                if generation == self.sleep_generation {
                    self.on_sleep_timer_expired();
                } else {
                    debug!(generation, "Ignoring expiry of a replaced sleep timer");
                }
            }
        }
    }

    fn on_engine_event(&mut self, event: &EngineEvent) {
        if self.engine.is_none() {
            return;
        }
        match event {
            EngineEvent::IsPlayingChanged(playing) => {
                let _ = self
                    .state_tx
                    .send(AppStateEvent::PlaybackStateChanged(*playing));
            }
            EngineEvent::MediaItemTransition { .. } => {
                if self.binding.on_event(event) {
                    let _ = self.state_tx.send(AppStateEvent::CurrentTrackChanged(
                        self.binding.current_track().cloned(),
                    ));
                }
            }
        }
    }

    /// Applies every message already in the inbox. Returns how many.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.inbox.try_recv() {
            self.handle_message(message);
            handled += 1;
        }
        handled
    }

    /// Waits for the next inbox message and applies it.
    pub async fn handle_next(&mut self) {
        // The controller holds a sender itself, so the inbox never closes.
        if let Ok(message) = self.inbox.recv().await {
            self.handle_message(message);
        }
    }

    /// Applies inbox messages until the task is cancelled.
    pub async fn run(&mut self) {
        loop {
            self.handle_next().await;
        }
    }

    /// Stops and releases the engine and cancels the sleep timer.
    pub fn shutdown(&mut self) {
        self.sleep_generation += 1;
        self.sleep_timer.cancel();
        self.sleep_remaining = None;
        if let Some(mut engine) = self.engine.take() {
            engine.stop();
            info!("Playback engine released");
        }
    }

    // Helpers

    fn current_id(&self) -> Option<TrackId> {
        self.binding.current_track().map(|t| t.id)
    }

    fn current_changed(&self, before: Option<TrackId>) {
        if self.current_id() != before {
            let _ = self.state_tx.send(AppStateEvent::CurrentTrackChanged(
                self.binding.current_track().cloned(),
            ));
        }
    }

    fn notify(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        let _ = self.state_tx.send(AppStateEvent::Notice(message));
    }
}

impl<E: PlaybackEngine> Drop for AppState<E> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
