//! Track catalog and the collections derived from it.
//!
//! Catalog loading, the filtered/sorted projection, favorites and playlists.

pub mod catalog;
pub mod favorites;
pub mod models;
pub mod playlists;
pub mod projection;
pub mod scanner;

pub use {
    catalog::{CatalogLoader, CatalogSource, StaticCatalogSource},
    favorites::FavoritesManager,
    models::{Catalog, CatalogEntry, Track, TrackId},
    playlists::{Playlist, PlaylistId, PlaylistManager},
    projection::{SortKey, ViewMode, ViewState, recompute},
    scanner::DirectoryCatalogSource,
};
