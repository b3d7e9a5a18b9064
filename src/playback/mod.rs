//! Playback control.
//!
//! Provides the engine contract with an in-memory reference engine, the
//! binding that keeps the engine queue in step with the visible projection,
//! and the sleep timer.

pub mod binding;
pub mod engine;
pub mod sleep_timer;

pub use {
    binding::{QueueBinding, ReconcileOutcome},
    engine::{
        EngineEvent, EngineSnapshot, EventListener, MemoryEngine, PlaybackEngine, QueueItem,
        RepeatMode,
    },
    sleep_timer::SleepTimer,
};
