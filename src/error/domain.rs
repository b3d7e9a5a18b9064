//! Domain-specific error types using `thiserror`.
//!
//! Every recoverable condition of the player surfaces as one of these enums.
//! Callers decide how to degrade; none of them is fatal to a session.

use std::{io::Error as IoError, path::PathBuf};

use {serde_json::Error as SerdeJsonError, thiserror::Error};

/// Errors raised while building a catalog from a catalog source.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The media index could not be read.
    #[error("IO error while reading {path:?}: {source}")]
    Io {
        /// Location that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: IoError,
    },
    /// The source refused access (missing permission, unmounted volume).
    #[error("Catalog source unavailable: {reason}")]
    Unavailable { reason: String },
    /// The background load task died before producing a result.
    #[error("Catalog load task failed: {0}")]
    TaskFailed(String),
}

/// Errors raised by the key-value preference store.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The partition file could not be read or written.
    #[error("IO error: {0}")]
    Io(#[from] IoError),
    /// The partition file is not a valid JSON object.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
}

/// Errors raised by playlist mutations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlaylistError {
    /// Playlist names must contain something besides whitespace.
    #[error("Playlist name cannot be empty")]
    EmptyName,
    /// No playlist carries the given id.
    #[error("Playlist not found: {id}")]
    NotFound { id: i64 },
}

/// Errors raised by a playback engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine could not be brought up; playback is disabled.
    #[error("Engine initialization failed: {reason}")]
    Initialization { reason: String },
    /// The engine refused a command in its current state.
    #[error("Invalid operation: {reason}")]
    InvalidOperation { reason: String },
}
