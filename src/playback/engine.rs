//! Playback engine contract and the in-process reference engine.
//!
//! The engine owns an index-addressed queue of playable items and reports
//! transitions through an event listener. Decoding and output are outside
//! this crate; [`MemoryEngine`] performs only the queue bookkeeping.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use {
    rand::{seq::SliceRandom, thread_rng},
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

use crate::library::{Track, TrackId};

/// Rewinding within this many milliseconds of a track's start skips to the
/// previous item instead.
const PREVIOUS_RESTART_THRESHOLD_MS: u64 = 3_000;

/// One playable entry of the engine queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    /// Identifier of the track this item plays.
    pub track_id: TrackId,
    /// Location of the audio file.
    pub path: String,
}

impl From<&Track> for QueueItem {
    fn from(track: &Track) -> Self {
        Self {
            track_id: track.id,
            path: track.path.clone(),
        }
    }
}

/// Repeat behaviour at the end of a track or of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepeatMode {
    /// Stop at the end of the queue.
    #[default]
    Off,
    /// Wrap around to the start of the queue.
    All,
    /// Replay the current item.
    One,
}

impl RepeatMode {
    /// The mode selected by the next press of the repeat button.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }

    /// Notice shown after switching to this mode.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            RepeatMode::Off => "Repeat off",
            RepeatMode::All => "Repeat all",
            RepeatMode::One => "Repeat one",
        }
    }
}

/// Asynchronous notifications emitted by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The current queue position changed.
    MediaItemTransition {
        /// New queue index, `None` when nothing is current.
        index: Option<usize>,
        /// Track id of the new item, when the engine knows it.
        track_id: Option<TrackId>,
    },
    /// Playback started or stopped.
    IsPlayingChanged(bool),
}

/// Callback receiving engine events.
pub type EventListener = Box<dyn Fn(EngineEvent) + Send + Sync>;

/// Point-in-time copy of the engine's queue state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineSnapshot {
    /// Loaded queue.
    pub queue: Vec<QueueItem>,
    /// Current queue index; `None` or a valid index into `queue`.
    pub current_index: Option<usize>,
    /// Whether audio is playing.
    pub is_playing: bool,
    /// Position within the current item.
    pub position_ms: u64,
    /// Whether shuffle is enabled.
    pub shuffle: bool,
    /// Active repeat mode.
    pub repeat_mode: RepeatMode,
}

impl EngineSnapshot {
    /// The current queue item, if any.
    #[must_use]
    pub fn current_item(&self) -> Option<&QueueItem> {
        self.current_index.and_then(|i| self.queue.get(i))
    }
}

/// Index-addressed playback engine.
///
/// Commands never fail; a command that makes no sense in the current state
/// (seeking past the queue, playing with nothing loaded) is ignored.
pub trait PlaybackEngine {
    /// Installs the listener that receives every subsequent event.
    fn set_event_listener(&mut self, listener: EventListener);

    /// Replaces the queue. The engine is left paused at the start of the
    /// first item (or with no current item for an empty queue).
    fn load_queue(&mut self, items: Vec<QueueItem>);

    /// Moves to `position_ms` within the item at `index`.
    fn seek(&mut self, index: usize, position_ms: u64);

    /// Starts or resumes playback of the current item.
    fn play(&mut self);

    /// Pauses playback, keeping the position.
    fn pause(&mut self);

    /// Stops playback and rewinds the current item.
    fn stop(&mut self);

    /// Moves to the next item per shuffle and repeat settings.
    fn next(&mut self);

    /// Restarts the current item, or moves to the previous one near its start.
    fn previous(&mut self);

    /// Enables or disables shuffled traversal.
    fn set_shuffle(&mut self, enabled: bool);

    /// Sets the repeat mode.
    fn set_repeat_mode(&mut self, mode: RepeatMode);

    /// Loaded queue.
    fn queue(&self) -> &[QueueItem];

    /// Current queue index.
    fn current_index(&self) -> Option<usize>;

    /// Whether audio is playing.
    fn is_playing(&self) -> bool;

    /// Position within the current item.
    fn position_ms(&self) -> u64;

    /// Whether shuffle is enabled.
    fn shuffle(&self) -> bool;

    /// Active repeat mode.
    fn repeat_mode(&self) -> RepeatMode;

    /// Copies the observable queue state.
    fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            queue: self.queue().to_vec(),
            current_index: self.current_index(),
            is_playing: self.is_playing(),
            position_ms: self.position_ms(),
            shuffle: self.shuffle(),
            repeat_mode: self.repeat_mode(),
        }
    }
}

/// Reference engine that keeps queue state in memory.
///
/// Time does not advance on its own; callers drive it with
/// [`MemoryEngine::advance`] and [`MemoryEngine::complete_current`].
#[derive(Default)]
pub struct MemoryEngine {
    queue: Vec<QueueItem>,
    current_index: Option<usize>,
    is_playing: bool,
    position_ms: u64,
    shuffle: bool,
    repeat_mode: RepeatMode,
    /// Traversal order over queue indices; identity unless shuffled.
    order: Vec<usize>,
    listener: Option<EventListener>,
}

impl Debug for MemoryEngine {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MemoryEngine")
            .field("queue_len", &self.queue.len())
            .field("current_index", &self.current_index)
            .field("is_playing", &self.is_playing)
            .field("position_ms", &self.position_ms)
            .field("shuffle", &self.shuffle)
            .field("repeat_mode", &self.repeat_mode)
            .finish_non_exhaustive()
    }
}

impl MemoryEngine {
    /// Creates an idle engine with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the playback position forward while playing.
    pub fn advance(&mut self, elapsed_ms: u64) {
        if self.is_playing {
            self.position_ms = self.position_ms.saturating_add(elapsed_ms);
        }
    }

    /// Simulates the current item playing to its end.
    pub fn complete_current(&mut self) {
        let Some(current) = self.current_index else {
            return;
        };

        if self.repeat_mode == RepeatMode::One {
            self.position_ms = 0;
            self.emit_transition(current);
            return;
        }

        match self.step(current, 1) {
            Some(next) => self.move_to(next, 0),
            None => {
                debug!("MemoryEngine: reached end of queue");
                self.position_ms = 0;
                self.set_playing(false);
            }
        }
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(listener) = &self.listener {
            listener(event);
        }
    }

    fn emit_transition(&self, index: usize) {
        self.emit(EngineEvent::MediaItemTransition {
            index: Some(index),
            track_id: self.queue.get(index).map(|item| item.track_id),
        });
    }

    fn set_playing(&mut self, playing: bool) {
        if self.is_playing != playing {
            self.is_playing = playing;
            self.emit(EngineEvent::IsPlayingChanged(playing));
        }
    }

    fn move_to(&mut self, index: usize, position_ms: u64) {
        self.position_ms = position_ms;
        if self.current_index != Some(index) {
            self.current_index = Some(index);
            self.emit_transition(index);
        }
    }

    /// Queue index `delta` steps away from `from` in traversal order.
    fn step(&self, from: usize, delta: isize) -> Option<usize> {
        let len = self.order.len();
        let slot = self.order.iter().position(|&i| i == from)?;
        let target = slot.checked_add_signed(delta);
        match target {
            Some(t) if t < len => Some(self.order[t]),
            _ if self.repeat_mode == RepeatMode::All && len > 0 => {
                let wrapped = if delta.is_negative() { len - 1 } else { 0 };
                Some(self.order[wrapped])
            }
            _ => None,
        }
    }

    fn rebuild_order(&mut self) {
        self.order = (0..self.queue.len()).collect();
        if self.shuffle {
            self.order.shuffle(&mut thread_rng());
            // The current item stays first so shuffling never replays it.
            if let Some(current) = self.current_index
                && let Some(slot) = self.order.iter().position(|&i| i == current)
            {
                self.order.swap(0, slot);
            }
        }
    }
}

impl PlaybackEngine for MemoryEngine {
    fn set_event_listener(&mut self, listener: EventListener) {
        self.listener = Some(listener);
    }

    fn load_queue(&mut self, items: Vec<QueueItem>) {
        debug!("MemoryEngine: loading queue with {} items", items.len());
        self.set_playing(false);
        self.queue = items;
        self.current_index = if self.queue.is_empty() { None } else { Some(0) };
        self.position_ms = 0;
        self.rebuild_order();
    }

    fn seek(&mut self, index: usize, position_ms: u64) {
        if index >= self.queue.len() {
            warn!(
                index,
                len = self.queue.len(),
                "MemoryEngine: ignoring seek past end of queue"
            );
            return;
        }
        self.move_to(index, position_ms);
    }

    fn play(&mut self) {
        if self.current_index.is_some() {
            self.set_playing(true);
        }
    }

    fn pause(&mut self) {
        self.set_playing(false);
    }

    fn stop(&mut self) {
        self.set_playing(false);
        self.position_ms = 0;
    }

    fn next(&mut self) {
        if let Some(next) = self.current_index.and_then(|current| self.step(current, 1)) {
            self.move_to(next, 0);
        }
    }

    fn previous(&mut self) {
        let Some(current) = self.current_index else {
            return;
        };
        if self.position_ms > PREVIOUS_RESTART_THRESHOLD_MS {
            self.position_ms = 0;
            return;
        }
        match self.step(current, -1) {
            Some(previous) => self.move_to(previous, 0),
            None => self.position_ms = 0,
        }
    }

    fn set_shuffle(&mut self, enabled: bool) {
        if self.shuffle != enabled {
            self.shuffle = enabled;
            self.rebuild_order();
        }
    }

    fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
    }

    fn queue(&self) -> &[QueueItem] {
        &self.queue
    }

    fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    fn is_playing(&self) -> bool {
        self.is_playing
    }

    fn position_ms(&self) -> u64 {
        self.position_ms
    }

    fn shuffle(&self) -> bool {
        self.shuffle
    }

    fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }
}
