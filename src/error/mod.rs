//! Error handling built on `thiserror` and `anyhow`.
//!
//! Domain errors are precise enums for the catalog, persistence, playlist and
//! engine layers. Operational errors carry `anyhow` context and are logged
//! through [`ErrorReporter`].

pub mod domain;
pub mod operational;

pub use {
    domain::{CatalogError, EngineError, PersistenceError, PlaylistError},
    operational::{ErrorReporter, ResultExt},
};
