//! Key-value preference partitions.
//!
//! Theme, favorites and playlists each persist into their own named
//! partition. A partition is a flat map of string keys to string or integer
//! values; [`FilePreferenceStore`] keeps one JSON object file per partition.

use std::{
    collections::HashMap,
    fmt::Debug,
    fs::{create_dir_all, read_to_string, write},
    path::{Path, PathBuf},
};

use {
    parking_lot::RwLock,
    serde_json::{Map, Value, from_str, to_string_pretty},
    tracing::{debug, warn},
};

use crate::error::PersistenceError;

/// Independent storage scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Selected visual theme.
    Theme,
    /// Favorite track ids.
    Favorites,
    /// User playlists and the playlist id counter.
    Playlists,
}

impl Partition {
    /// All partitions, in load order.
    pub const ALL: [Partition; 3] = [Partition::Theme, Partition::Favorites, Partition::Playlists];

    /// Stable on-disk name of the partition.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Partition::Theme => "theme_prefs",
            Partition::Favorites => "favorites_prefs",
            Partition::Playlists => "playlist_prefs",
        }
    }
}

/// Key-value persistence scoped by [`Partition`].
///
/// Reads never fail: a missing key, or a key holding a value of the other
/// type, reads as `None`.
pub trait PreferenceStore: Send + Sync + Debug {
    /// Reads a string value.
    fn get_string(&self, partition: Partition, key: &str) -> Option<String>;

    /// Writes a string value.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the partition cannot be written.
    fn put_string(
        &self,
        partition: Partition,
        key: &str,
        value: &str,
    ) -> Result<(), PersistenceError>;

    /// Reads an integer value.
    fn get_i64(&self, partition: Partition, key: &str) -> Option<i64>;

    /// Writes an integer value.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the partition cannot be written.
    fn put_i64(&self, partition: Partition, key: &str, value: i64) -> Result<(), PersistenceError>;
}

/// File-backed preference store, one `<partition>.json` per partition.
#[derive(Debug)]
pub struct FilePreferenceStore {
    /// Directory holding the partition files.
    dir: PathBuf,
    /// In-memory copy of every partition.
    partitions: RwLock<HashMap<Partition, Map<String, Value>>>,
}

impl FilePreferenceStore {
    /// Opens the store rooted at `dir`, creating the directory if needed.
    ///
    /// A partition file that is not a JSON object is logged and treated as
    /// empty; it is overwritten on the next write to that partition.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Io` if the directory cannot be created.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, PersistenceError> {
        let dir = dir.as_ref().to_path_buf();
        create_dir_all(&dir)?;

        let mut partitions = HashMap::new();
        for partition in Partition::ALL {
            let path = Self::partition_path(&dir, partition);
            let values = if path.exists() {
                match read_to_string(&path)
                    .map_err(PersistenceError::from)
                    .and_then(|contents| {
                        from_str::<Map<String, Value>>(&contents).map_err(Into::into)
                    })
                {
                    Ok(values) => values,
                    Err(e) => {
                        warn!(
                            partition = partition.name(),
                            error = %e,
                            "Discarding unreadable partition"
                        );
                        Map::new()
                    }
                }
            } else {
                Map::new()
            };
            partitions.insert(partition, values);
        }

        debug!("Opened preference store at {:?}", dir);
        Ok(Self {
            dir,
            partitions: RwLock::new(partitions),
        })
    }

    fn partition_path(dir: &Path, partition: Partition) -> PathBuf {
        dir.join(format!("{}.json", partition.name()))
    }

    fn put_value(
        &self,
        partition: Partition,
        key: &str,
        value: Value,
    ) -> Result<(), PersistenceError> {
        let contents = {
            let mut partitions = self.partitions.write();
            let values = partitions.entry(partition).or_default();
            values.insert(key.to_string(), value);
            to_string_pretty(values)?
        };
        write(Self::partition_path(&self.dir, partition), contents)?;
        Ok(())
    }

    fn get_value(&self, partition: Partition, key: &str) -> Option<Value> {
        self.partitions
            .read()
            .get(&partition)
            .and_then(|values| values.get(key).cloned())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get_string(&self, partition: Partition, key: &str) -> Option<String> {
        self.get_value(partition, key)
            .and_then(|value| value.as_str().map(str::to_string))
    }

    fn put_string(
        &self,
        partition: Partition,
        key: &str,
        value: &str,
    ) -> Result<(), PersistenceError> {
        self.put_value(partition, key, Value::from(value))
    }

    fn get_i64(&self, partition: Partition, key: &str) -> Option<i64> {
        self.get_value(partition, key).and_then(|value| value.as_i64())
    }

    fn put_i64(&self, partition: Partition, key: &str, value: i64) -> Result<(), PersistenceError> {
        self.put_value(partition, key, Value::from(value))
    }
}

/// Volatile preference store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: RwLock<HashMap<(Partition, String), Value>>,
}

impl MemoryPreferenceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_string(&self, partition: Partition, key: &str) -> Option<String> {
        self.values
            .read()
            .get(&(partition, key.to_string()))
            .and_then(|value| value.as_str().map(str::to_string))
    }

    fn put_string(
        &self,
        partition: Partition,
        key: &str,
        value: &str,
    ) -> Result<(), PersistenceError> {
        self.values
            .write()
            .insert((partition, key.to_string()), Value::from(value));
        Ok(())
    }

    fn get_i64(&self, partition: Partition, key: &str) -> Option<i64> {
        self.values
            .read()
            .get(&(partition, key.to_string()))
            .and_then(Value::as_i64)
    }

    fn put_i64(&self, partition: Partition, key: &str, value: i64) -> Result<(), PersistenceError> {
        self.values
            .write()
            .insert((partition, key.to_string()), Value::from(value));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::TempDir;

    use crate::config::preferences::{
        FilePreferenceStore, MemoryPreferenceStore, Partition, PreferenceStore,
    };

    #[test]
    fn test_memory_store_partitions_are_independent() {
        let store = MemoryPreferenceStore::new();
        store.put_string(Partition::Theme, "key", "theme").unwrap();
        store.put_string(Partition::Favorites, "key", "favorites").unwrap();

        assert_eq!(store.get_string(Partition::Theme, "key").as_deref(), Some("theme"));
        assert_eq!(
            store.get_string(Partition::Favorites, "key").as_deref(),
            Some("favorites")
        );
        assert_eq!(store.get_string(Partition::Playlists, "key"), None);
    }

    #[test]
    fn test_type_mismatch_reads_as_none() {
        let store = MemoryPreferenceStore::new();
        store.put_i64(Partition::Playlists, "next_playlist_id", 4).unwrap();
        assert_eq!(store.get_string(Partition::Playlists, "next_playlist_id"), None);
        assert_eq!(store.get_i64(Partition::Playlists, "next_playlist_id"), Some(4));
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();

        let store = FilePreferenceStore::open(temp_dir.path()).unwrap();
        store
            .put_string(Partition::Favorites, "favorite_songs", "1,2")
            .unwrap();
        store.put_i64(Partition::Playlists, "next_playlist_id", 3).unwrap();
        drop(store);

        let reopened = FilePreferenceStore::open(temp_dir.path()).unwrap();
        assert_eq!(
            reopened
                .get_string(Partition::Favorites, "favorite_songs")
                .as_deref(),
            Some("1,2")
        );
        assert_eq!(reopened.get_i64(Partition::Playlists, "next_playlist_id"), Some(3));
    }

    #[test]
    fn test_corrupt_partition_file_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path().join("theme_prefs.json"), "not json").unwrap();

        let store = FilePreferenceStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.get_string(Partition::Theme, "selected_theme"), None);

        store
            .put_string(Partition::Theme, "selected_theme", "TIDAL")
            .unwrap();
        assert_eq!(
            store.get_string(Partition::Theme, "selected_theme").as_deref(),
            Some("TIDAL")
        );
    }
}
