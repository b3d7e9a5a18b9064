//! Data models for the track catalog.
//!
//! A [`Track`] is an immutable description of one audio file. A [`Catalog`]
//! is the full, unfiltered list of tracks discovered in one load; it is
//! replaced wholesale on reload and never mutated in place.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque, stable track identifier.
pub type TrackId = i64;

/// Title used when the media index has none.
pub const UNKNOWN_TITLE: &str = "Unknown";
/// Artist used when the media index has none.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
/// Album used when the media index has none.
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Represents one audio track in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier within a catalog.
    pub id: TrackId,
    /// Track title.
    pub title: String,
    /// Track artist.
    pub artist: String,
    /// Album name.
    pub album: String,
    /// File system path to the audio file.
    pub path: String,
    /// Duration in milliseconds.
    pub duration_ms: u64,
    /// Epoch seconds at which the media index first saw the file.
    pub date_added: i64,
    /// Identifier of the album the track belongs to.
    pub album_id: i64,
}

impl Track {
    /// Key under which the album artwork for this track can be resolved.
    #[must_use]
    pub fn album_art_key(&self) -> String {
        format!("albumart/{}", self.album_id)
    }
}

/// One row returned by a catalog source, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogEntry {
    /// Identifier assigned by the media index.
    pub id: TrackId,
    /// Title tag, if any.
    pub title: Option<String>,
    /// File system path; entries with an empty path are dropped.
    pub path: String,
    /// Duration in milliseconds (negative values clamp to zero).
    pub duration_ms: i64,
    /// Epoch seconds at which the file was added.
    pub date_added: i64,
    /// Album identifier.
    pub album_id: i64,
    /// Artist tag, if any.
    pub artist: Option<String>,
    /// Album tag, if any.
    pub album: Option<String>,
}

impl CatalogEntry {
    /// Converts the entry into a track, filling in missing tags.
    ///
    /// Returns `None` for entries without a playable location.
    #[must_use]
    pub fn into_track(self) -> Option<Track> {
        if self.path.is_empty() {
            return None;
        }
        Some(Track {
            id: self.id,
            title: self.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            artist: self.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            album: self.album.unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
            path: self.path,
            duration_ms: u64::try_from(self.duration_ms).unwrap_or(0),
            date_added: self.date_added,
            album_id: self.album_id,
        })
    }
}

/// Ordered, immutable list of every track found in one load.
///
/// Cloning is cheap; clones share the same track storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    tracks: Arc<[Track]>,
}

impl Catalog {
    /// Builds a catalog from raw entries, dropping those without a path.
    #[must_use]
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self {
            tracks: entries
                .into_iter()
                .filter_map(CatalogEntry::into_track)
                .collect(),
        }
    }

    /// Builds a catalog from already-validated tracks.
    #[must_use]
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        Self {
            tracks: tracks.into_iter().filter(|t| !t.path.is_empty()).collect(),
        }
    }

    /// All tracks in load order.
    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Number of tracks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the catalog has no tracks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// First track carrying `id`, if any.
    #[must_use]
    pub fn find(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }
}
