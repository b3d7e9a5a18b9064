//! Filtered, sorted views over the catalog.
//!
//! A projection is the list of tracks currently displayed and playable. It
//! is a pure function of the catalog, the view mode, the favorites set,
//! playlist membership, the free-text query and the sort key, and it is
//! always recomputed from scratch.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::library::{
    models::{Catalog, Track, TrackId},
    playlists::{Playlist, PlaylistId},
};

/// Ordering applied to a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Title, case-insensitive ascending.
    #[default]
    Title,
    /// Artist, case-insensitive ascending.
    Artist,
    /// Most recently added first.
    DateAddedDesc,
    /// Longest first.
    DurationDesc,
}

impl SortKey {
    /// Every sort key, in cycling order.
    pub const ALL: [SortKey; 4] = [
        SortKey::Title,
        SortKey::Artist,
        SortKey::DateAddedDesc,
        SortKey::DurationDesc,
    ];

    /// The key selected by the next press of the sort button.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            SortKey::Title => SortKey::Artist,
            SortKey::Artist => SortKey::DateAddedDesc,
            SortKey::DateAddedDesc => SortKey::DurationDesc,
            SortKey::DurationDesc => SortKey::Title,
        }
    }

    /// Short label for the sort button.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Title => "Sort: Name",
            SortKey::Artist => "Sort: Artist",
            SortKey::DateAddedDesc => "Sort: Date",
            SortKey::DurationDesc => "Sort: Duration",
        }
    }

    /// Sorts `tracks` in place. Equal keys keep their relative order.
    pub fn apply(self, tracks: &mut [Track]) {
        match self {
            SortKey::Title => tracks.sort_by_cached_key(|t| t.title.to_lowercase()),
            SortKey::Artist => tracks.sort_by_cached_key(|t| t.artist.to_lowercase()),
            SortKey::DateAddedDesc => tracks.sort_by(|a, b| b.date_added.cmp(&a.date_added)),
            SortKey::DurationDesc => tracks.sort_by(|a, b| b.duration_ms.cmp(&a.duration_ms)),
        }
    }
}

/// Which tracks are eligible for the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    /// Every catalog track.
    #[default]
    AllTracks,
    /// Only favorite tracks.
    Favorites,
    /// Only members of one playlist.
    Playlist(PlaylistId),
}

/// User-controlled projection inputs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    /// Active view mode.
    pub mode: ViewMode,
    /// Free-text filter; empty means no filtering.
    pub query: String,
    /// Active sort key.
    pub sort: SortKey,
}

/// Whether `track` matches `needle`, which must already be lowercase.
fn matches_query(track: &Track, needle: &str) -> bool {
    track.title.to_lowercase().contains(needle)
        || track.artist.to_lowercase().contains(needle)
        || track.album.to_lowercase().contains(needle)
}

/// Computes the projection for the given inputs.
///
/// Playlist views keep catalog order (a playlist acts as a membership
/// filter); the sort key then orders the result. An unknown playlist id
/// yields an empty projection.
#[must_use]
pub fn recompute(
    catalog: &Catalog,
    view: &ViewState,
    favorites: &HashSet<TrackId>,
    playlists: &[Playlist],
) -> Vec<Track> {
    let members: Option<HashSet<TrackId>> = match view.mode {
        ViewMode::AllTracks => None,
        ViewMode::Favorites => Some(favorites.clone()),
        ViewMode::Playlist(id) => Some(
            playlists
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.song_ids.iter().copied().collect())
                .unwrap_or_default(),
        ),
    };

    let needle = view.query.trim().to_lowercase();

    let mut tracks: Vec<Track> = catalog
        .tracks()
        .iter()
        .filter(|t| members.as_ref().is_none_or(|ids| ids.contains(&t.id)))
        .filter(|t| needle.is_empty() || matches_query(t, &needle))
        .cloned()
        .collect();

    view.sort.apply(&mut tracks);
    tracks
}
