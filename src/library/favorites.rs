//! Favorite tracks, persisted as a comma-joined id list.

use std::{collections::HashSet, sync::Arc};

use tracing::debug;

use crate::{
    config::{Partition, PreferenceStore},
    error::ResultExt,
    library::models::TrackId,
};

/// Preference key holding the comma-joined favorite ids.
const FAVORITES_KEY: &str = "favorite_songs";

/// Set of favorite track ids backed by the favorites partition.
#[derive(Debug, Clone)]
pub struct FavoritesManager {
    store: Arc<dyn PreferenceStore>,
    favorites: HashSet<TrackId>,
}

impl FavoritesManager {
    /// Loads the favorites set; unparseable fragments are skipped.
    #[must_use]
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        let favorites = store
            .get_string(Partition::Favorites, FAVORITES_KEY)
            .map(|raw| parse_ids(&raw))
            .unwrap_or_default();
        debug!("Loaded {} favorites", favorites.len());

        Self { store, favorites }
    }

    /// Current favorites.
    #[must_use]
    pub fn favorites(&self) -> &HashSet<TrackId> {
        &self.favorites
    }

    /// Whether `id` is a favorite.
    #[must_use]
    pub fn is_favorite(&self, id: TrackId) -> bool {
        self.favorites.contains(&id)
    }

    /// Flips membership of `id`, persists, and returns the new membership.
    pub fn toggle(&mut self, id: TrackId) -> bool {
        let now_favorite = if self.favorites.remove(&id) {
            false
        } else {
            self.favorites.insert(id);
            true
        };
        self.save();
        now_favorite
    }

    fn save(&self) {
        let mut ids: Vec<TrackId> = self.favorites.iter().copied().collect();
        ids.sort_unstable();
        let joined = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        self.store
            .put_string(Partition::Favorites, FAVORITES_KEY, &joined)
            .or_warn("Failed to persist favorites");
    }
}

fn parse_ids(raw: &str) -> HashSet<TrackId> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        config::{MemoryPreferenceStore, Partition, PreferenceStore},
        library::favorites::FavoritesManager,
    };

    fn store() -> Arc<MemoryPreferenceStore> {
        Arc::new(MemoryPreferenceStore::new())
    }

    #[test]
    fn test_empty_store_has_no_favorites() {
        let manager = FavoritesManager::new(store());
        assert!(manager.favorites().is_empty());
        assert!(!manager.is_favorite(1));
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let mut manager = FavoritesManager::new(store());
        for id in [1, 2, 42] {
            let original = manager.is_favorite(id);
            let first = manager.toggle(id);
            assert_eq!(first, !original);
            let second = manager.toggle(id);
            assert_eq!(second, original);
            assert_eq!(manager.is_favorite(id), original);
        }
    }

    #[test]
    fn test_toggle_persists_comma_joined() {
        let store = store();
        let mut manager = FavoritesManager::new(store.clone());
        manager.toggle(3);
        manager.toggle(1);

        assert_eq!(
            store.get_string(Partition::Favorites, "favorite_songs").as_deref(),
            Some("1,3")
        );

        let reloaded = FavoritesManager::new(store);
        assert!(reloaded.is_favorite(1));
        assert!(reloaded.is_favorite(3));
    }

    #[test]
    fn test_malformed_fragments_are_skipped() {
        let store = store();
        store
            .put_string(Partition::Favorites, "favorite_songs", "1,abc,,2,2")
            .unwrap();

        let manager = FavoritesManager::new(store);
        assert_eq!(manager.favorites().len(), 2);
        assert!(manager.is_favorite(1));
        assert!(manager.is_favorite(2));
    }

    #[test]
    fn test_removing_last_favorite_persists_empty_string() {
        let store = store();
        let mut manager = FavoritesManager::new(store.clone());
        manager.toggle(5);
        manager.toggle(5);
        assert_eq!(
            store.get_string(Partition::Favorites, "favorite_songs").as_deref(),
            Some("")
        );
    }
}
