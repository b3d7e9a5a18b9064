//! Keeps the engine queue aligned with the current projection.
//!
//! The binding remembers the last projection it was given and translates
//! projection changes into engine commands: the engine queue always mirrors
//! the projection one-to-one, and whatever was playing keeps playing from the
//! same position when it survives the change. Every operation is total;
//! edge cases resolve to a no-op or to "no current track".

use tracing::{debug, warn};

use crate::{
    library::{Track, TrackId},
    playback::engine::{EngineEvent, PlaybackEngine, QueueItem, RepeatMode},
};

/// Result of reconciling a new projection with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The projection is empty; the engine was stopped and cleared.
    Cleared,
    /// The engine already held this exact queue; nothing was reloaded.
    Unchanged,
    /// The queue was reloaded and the previous track resumed at `index`.
    Resumed {
        /// Index of the previous track in the new queue.
        index: usize,
        /// Position restored within that track.
        position_ms: u64,
        /// Whether playback was restarted.
        playing: bool,
    },
    /// The queue was reloaded; the previous track is no longer in it.
    CurrentFilteredOut,
    /// The queue was reloaded; nothing was current before.
    Loaded,
}

/// Binding between a projection and an index-addressed engine.
#[derive(Debug, Clone, Default)]
pub struct QueueBinding {
    /// Last projection handed to the engine.
    projection: Vec<Track>,
    /// Track the engine is positioned on, as last derived.
    current: Option<Track>,
}

fn queue_matches(queue: &[QueueItem], projection: &[Track]) -> bool {
    queue.len() == projection.len()
        && queue
            .iter()
            .zip(projection)
            .all(|(item, track)| item.track_id == track.id)
}

fn to_queue(projection: &[Track]) -> Vec<QueueItem> {
    projection.iter().map(QueueItem::from).collect()
}

impl QueueBinding {
    /// Creates a binding with an empty projection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-known projection.
    #[must_use]
    pub fn projection(&self) -> &[Track] {
        &self.projection
    }

    /// Track the engine is currently positioned on, if any.
    #[must_use]
    pub fn current_track(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    /// Replaces the projection without touching any engine.
    ///
    /// Used when playback is unavailable; the current track is cleared.
    pub fn set_projection(&mut self, projection: Vec<Track>) {
        self.projection = projection;
        self.current = None;
    }

    /// Aligns the engine queue with `projection`, preserving the playing
    /// track and its position when it is still present.
    pub fn reconcile<E: PlaybackEngine + ?Sized>(
        &mut self,
        projection: Vec<Track>,
        engine: &mut E,
    ) -> ReconcileOutcome {
        self.projection = projection;

        if self.projection.is_empty() {
            engine.stop();
            engine.load_queue(Vec::new());
            self.current = None;
            debug!("QueueBinding: projection empty, engine cleared");
            return ReconcileOutcome::Cleared;
        }

        let has_current = self.current.is_some() || engine.is_playing();

        if queue_matches(engine.queue(), &self.projection) {
            self.current = if has_current {
                engine
                    .current_index()
                    .and_then(|i| self.projection.get(i))
                    .cloned()
            } else {
                None
            };
            return ReconcileOutcome::Unchanged;
        }

        // A freshly loaded engine parks at index 0; that is not a current track.
        let prior_track_id: Option<TrackId> = engine
            .current_index()
            .filter(|_| has_current)
            .and_then(|i| engine.queue().get(i))
            .map(|item| item.track_id);
        let prior_was_playing = engine.is_playing();
        let prior_position_ms = engine.position_ms();

        let Some(prior_id) = prior_track_id else {
            engine.load_queue(to_queue(&self.projection));
            self.current = None;
            return ReconcileOutcome::Loaded;
        };

        match self.projection.iter().position(|t| t.id == prior_id) {
            Some(index) => {
                engine.load_queue(to_queue(&self.projection));
                engine.seek(index, prior_position_ms);
                if prior_was_playing {
                    engine.play();
                }
                self.current = Some(self.projection[index].clone());
                debug!(
                    index,
                    position_ms = prior_position_ms,
                    "QueueBinding: resumed previous track in new queue"
                );
                ReconcileOutcome::Resumed {
                    index,
                    position_ms: prior_position_ms,
                    playing: prior_was_playing,
                }
            }
            None => {
                if prior_was_playing {
                    engine.stop();
                }
                engine.load_queue(to_queue(&self.projection));
                self.current = None;
                debug!(track_id = prior_id, "QueueBinding: playing track filtered out");
                ReconcileOutcome::CurrentFilteredOut
            }
        }
    }

    /// Starts playback of the projection entry at `index`.
    ///
    /// Out-of-range indices leave the engine untouched. Returns whether
    /// playback was started.
    pub fn play_at<E: PlaybackEngine + ?Sized>(&mut self, index: usize, engine: &mut E) -> bool {
        let Some(track) = self.projection.get(index).cloned() else {
            debug!(
                index,
                len = self.projection.len(),
                "QueueBinding: ignoring play_at out of range"
            );
            return false;
        };

        if !queue_matches(engine.queue(), &self.projection) {
            engine.load_queue(to_queue(&self.projection));
        }
        engine.seek(index, 0);
        engine.play();
        self.current = Some(track);
        true
    }

    /// Re-derives the current track from an engine event.
    ///
    /// Returns `true` when the current track changed. The reported queue
    /// index is looked up in the last-known projection; an index outside it
    /// means no current track. When the event names a track id that
    /// disagrees with the entry at that index, the event predates the last
    /// rebuild and the id wins.
    pub fn on_event(&mut self, event: &EngineEvent) -> bool {
        let EngineEvent::MediaItemTransition { index, track_id } = event else {
            return false;
        };

        let by_position = (*index).and_then(|i| self.projection.get(i));
        let resolved = match (by_position, *track_id) {
            (Some(track), Some(id)) if track.id != id => {
                warn!(
                    index = ?index,
                    track_id = id,
                    "QueueBinding: stale transition, resolving by id"
                );
                self.projection.iter().find(|t| t.id == id)
            }
            (by_position, _) => by_position,
        }
        .cloned();

        let changed = resolved.as_ref().map(|t| t.id) != self.current.as_ref().map(|t| t.id);
        self.current = resolved;
        changed
    }

    /// Flips shuffle. With nothing queued or selected, starts from the top.
    ///
    /// Returns the new shuffle state.
    pub fn toggle_shuffle<E: PlaybackEngine + ?Sized>(&mut self, engine: &mut E) -> bool {
        let enabled = !engine.shuffle();
        engine.set_shuffle(enabled);

        if !self.projection.is_empty() && (engine.queue().is_empty() || self.current.is_none()) {
            self.play_at(0, engine);
        }
        enabled
    }

    /// Advances the repeat mode and returns it.
    pub fn cycle_repeat<E: PlaybackEngine + ?Sized>(&mut self, engine: &mut E) -> RepeatMode {
        let mode = engine.repeat_mode().next();
        engine.set_repeat_mode(mode);
        mode
    }

    /// Pauses when playing, otherwise resumes the current track.
    ///
    /// With no current track, playback starts from the item the engine is
    /// parked on (or the top), and that item becomes current.
    pub fn toggle_play_pause<E: PlaybackEngine + ?Sized>(&mut self, engine: &mut E) {
        if engine.is_playing() {
            engine.pause();
        } else if self.current.is_some() && engine.current_index().is_some() {
            engine.play();
        } else {
            let index = engine
                .current_index()
                .filter(|_| queue_matches(engine.queue(), &self.projection))
                .unwrap_or(0);
            self.play_at(index, engine);
        }
    }

    /// Moves to the next item.
    pub fn skip_next<E: PlaybackEngine + ?Sized>(&mut self, engine: &mut E) {
        engine.next();
    }

    /// Restarts the current item or moves to the previous one.
    pub fn skip_previous<E: PlaybackEngine + ?Sized>(&mut self, engine: &mut E) {
        engine.previous();
    }

    /// Seeks within the current item. Ignored with no current track.
    pub fn seek_to<E: PlaybackEngine + ?Sized>(&mut self, position_ms: u64, engine: &mut E) {
        if self.current.is_none() {
            return;
        }
        if let Some(index) = engine.current_index() {
            engine.seek(index, position_ms);
        }
    }
}
