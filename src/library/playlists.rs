//! User-defined playlists.
//!
//! Playlists persist as a JSON array of `{id, name, songIds}` objects in the
//! playlists partition. Ids come from a monotonically increasing counter
//! stored next to them, so a deleted playlist's id is never reused.

use std::sync::Arc;

use {
    serde::{Deserialize, Serialize},
    serde_json::{from_str, to_string},
    tracing::{debug, warn},
};

use crate::{
    config::{Partition, PreferenceStore},
    error::{PlaylistError, ResultExt},
    library::models::TrackId,
};

/// Playlist identifier.
pub type PlaylistId = i64;

const PLAYLISTS_KEY: &str = "playlists";
const NEXT_ID_KEY: &str = "next_playlist_id";

/// A named, ordered list of track ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    /// Unique id, assigned at creation.
    pub id: PlaylistId,
    /// Display name, never blank.
    pub name: String,
    /// Member track ids in insertion order, without duplicates.
    pub song_ids: Vec<TrackId>,
}

/// Owns the playlist list and keeps it persisted.
#[derive(Debug, Clone)]
pub struct PlaylistManager {
    store: Arc<dyn PreferenceStore>,
    playlists: Vec<Playlist>,
}

impl PlaylistManager {
    /// Loads playlists; malformed JSON loads as an empty list.
    #[must_use]
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        let playlists = match store.get_string(Partition::Playlists, PLAYLISTS_KEY) {
            Some(raw) => from_str(&raw).unwrap_or_else(|e| {
                warn!("Discarding malformed playlists: {e}");
                Vec::new()
            }),
            None => Vec::new(),
        };
        debug!("Loaded {} playlists", playlists.len());

        Self { store, playlists }
    }

    /// All playlists in creation order.
    #[must_use]
    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    /// Playlist with the given id.
    #[must_use]
    pub fn get(&self, id: PlaylistId) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.id == id)
    }

    /// Creates an empty playlist named `name` (trimmed).
    ///
    /// # Errors
    ///
    /// Returns `PlaylistError::EmptyName` if the name is blank.
    pub fn create(&mut self, name: &str) -> Result<Playlist, PlaylistError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlaylistError::EmptyName);
        }

        let playlist = Playlist {
            id: self.next_id(),
            name: name.to_string(),
            song_ids: Vec::new(),
        };
        self.playlists.push(playlist.clone());
        self.save();
        debug!(id = playlist.id, "Created playlist {}", playlist.name);
        Ok(playlist)
    }

    /// Appends `track_id` to a playlist; no-op if already present.
    ///
    /// # Errors
    ///
    /// Returns `PlaylistError::NotFound` if the playlist does not exist.
    pub fn add_track(&mut self, id: PlaylistId, track_id: TrackId) -> Result<(), PlaylistError> {
        let playlist = self.get_mut(id)?;
        if playlist.song_ids.contains(&track_id) {
            return Ok(());
        }
        playlist.song_ids.push(track_id);
        self.save();
        Ok(())
    }

    /// Removes `track_id` from a playlist; no-op if absent.
    ///
    /// # Errors
    ///
    /// Returns `PlaylistError::NotFound` if the playlist does not exist.
    pub fn remove_track(&mut self, id: PlaylistId, track_id: TrackId) -> Result<(), PlaylistError> {
        let playlist = self.get_mut(id)?;
        let before = playlist.song_ids.len();
        playlist.song_ids.retain(|&song| song != track_id);
        if playlist.song_ids.len() != before {
            self.save();
        }
        Ok(())
    }

    /// Deletes a playlist. Returns whether it existed.
    pub fn delete(&mut self, id: PlaylistId) -> bool {
        let before = self.playlists.len();
        self.playlists.retain(|p| p.id != id);
        let removed = self.playlists.len() != before;
        if removed {
            self.save();
        }
        removed
    }

    fn get_mut(&mut self, id: PlaylistId) -> Result<&mut Playlist, PlaylistError> {
        self.playlists
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(PlaylistError::NotFound { id })
    }

    /// Reserves the next id. Never reissues an id seen in the stored list.
    fn next_id(&self) -> PlaylistId {
        let stored = self
            .store
            .get_i64(Partition::Playlists, NEXT_ID_KEY)
            .unwrap_or(1);
        let past_existing = self
            .playlists
            .iter()
            .map(|p| p.id.saturating_add(1))
            .max()
            .unwrap_or(1);
        let id = stored.max(past_existing);

        self.store
            .put_i64(Partition::Playlists, NEXT_ID_KEY, id.saturating_add(1))
            .or_warn("Failed to persist playlist id counter");
        id
    }

    fn save(&self) {
        match to_string(&self.playlists) {
            Ok(json) => {
                if let Err(e) = self.store.put_string(Partition::Playlists, PLAYLISTS_KEY, &json) {
                    warn!("Failed to persist playlists: {e}");
                }
            }
            Err(e) => warn!("Failed to serialize playlists: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        config::{MemoryPreferenceStore, Partition, PreferenceStore},
        error::PlaylistError,
        library::playlists::PlaylistManager,
    };

    fn manager() -> (Arc<MemoryPreferenceStore>, PlaylistManager) {
        let store = Arc::new(MemoryPreferenceStore::new());
        let manager = PlaylistManager::new(store.clone());
        (store, manager)
    }

    #[test]
    fn test_create_assigns_increasing_ids() {
        let (_, mut manager) = manager();
        let first = manager.create("Road trip").unwrap();
        let second = manager.create("  Focus  ").unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(second.name, "Focus");
        assert!(second.song_ids.is_empty());
    }

    #[test]
    fn test_blank_names_are_rejected() {
        let (_, mut manager) = manager();
        assert_eq!(manager.create(""), Err(PlaylistError::EmptyName));
        assert_eq!(manager.create("   \t"), Err(PlaylistError::EmptyName));
        assert!(manager.playlists().is_empty());
    }

    #[test]
    fn test_add_track_is_idempotent() {
        let (_, mut manager) = manager();
        let id = manager.create("Mix").unwrap().id;

        manager.add_track(id, 10).unwrap();
        manager.add_track(id, 11).unwrap();
        let after_first = manager.get(id).unwrap().song_ids.clone();
        manager.add_track(id, 11).unwrap();

        assert_eq!(manager.get(id).unwrap().song_ids, after_first);
        assert_eq!(after_first, vec![10, 11]);
    }

    #[test]
    fn test_remove_absent_track_is_noop() {
        let (_, mut manager) = manager();
        let id = manager.create("Mix").unwrap().id;
        manager.add_track(id, 10).unwrap();

        manager.remove_track(id, 99).unwrap();
        assert_eq!(manager.get(id).unwrap().song_ids, vec![10]);

        manager.remove_track(id, 10).unwrap();
        assert!(manager.get(id).unwrap().song_ids.is_empty());
    }

    #[test]
    fn test_unknown_playlist_is_reported() {
        let (_, mut manager) = manager();
        assert_eq!(
            manager.add_track(5, 1),
            Err(PlaylistError::NotFound { id: 5 })
        );
        assert!(!manager.delete(5));
    }

    #[test]
    fn test_deleted_ids_are_not_reused() {
        let (_, mut manager) = manager();
        let first = manager.create("One").unwrap().id;
        assert!(manager.delete(first));
        let second = manager.create("Two").unwrap().id;
        assert!(second > first);
    }

    #[test]
    fn test_persisted_json_shape() {
        let (store, mut manager) = manager();
        let id = manager.create("Mix").unwrap().id;
        manager.add_track(id, 42).unwrap();

        assert_eq!(
            store.get_string(Partition::Playlists, "playlists").as_deref(),
            Some(r#"[{"id":1,"name":"Mix","songIds":[42]}]"#)
        );

        let reloaded = PlaylistManager::new(store);
        assert_eq!(reloaded.get(id).unwrap().song_ids, vec![42]);
    }

    #[test]
    fn test_malformed_json_loads_as_empty() {
        let store = Arc::new(MemoryPreferenceStore::new());
        store
            .put_string(Partition::Playlists, "playlists", "{not json")
            .unwrap();

        let mut manager = PlaylistManager::new(store);
        assert!(manager.playlists().is_empty());
        assert!(manager.create("Fresh").is_ok());
    }

    #[test]
    fn test_exhausted_id_space_does_not_overflow() {
        let store = Arc::new(MemoryPreferenceStore::new());
        store
            .put_string(
                Partition::Playlists,
                "playlists",
                &format!(r#"[{{"id":{},"name":"Last","songIds":[]}}]"#, i64::MAX),
            )
            .unwrap();
        store
            .put_i64(Partition::Playlists, "next_playlist_id", i64::MAX)
            .unwrap();

        let mut manager = PlaylistManager::new(store.clone());
        assert!(manager.create("Overflow").is_ok());
        assert_eq!(
            store.get_i64(Partition::Playlists, "next_playlist_id"),
            Some(i64::MAX)
        );
    }
}
