//! Directory-backed catalog source.
//!
//! Walks the configured library directories, keeps supported audio files and
//! reads their tags with `lofty`. Track ids are derived from the file path so
//! favorites and playlists survive across sessions.

use std::{
    fs::{metadata, read_dir},
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use {
    lofty::{
        prelude::{AudioFile, TaggedFileExt},
        probe::Probe,
        tag::Accessor,
    },
    tracing::{debug, warn},
};

use crate::{
    config::UserSettings,
    error::CatalogError,
    library::{
        catalog::CatalogSource,
        models::{CatalogEntry, TrackId},
    },
};

/// Supported audio file extensions.
const SUPPORTED_AUDIO_EXTENSIONS: &[&str] = &[
    "flac", "mp3", "aac", "m4a", "opus", "ogg", "wav", "aiff", "aif", "mpc",
];

/// Catalog source reading audio files below a set of directories.
#[derive(Debug, Clone)]
pub struct DirectoryCatalogSource {
    /// Library roots.
    directories: Vec<PathBuf>,
    /// Whether dot-files and dot-directories are included.
    include_hidden: bool,
}

impl DirectoryCatalogSource {
    /// Creates a source over `directories`.
    #[must_use]
    pub fn new(directories: Vec<PathBuf>, include_hidden: bool) -> Self {
        Self {
            directories,
            include_hidden,
        }
    }

    /// Creates a source from the library settings.
    #[must_use]
    pub fn from_settings(settings: &UserSettings) -> Self {
        Self::new(
            settings
                .library_directories
                .iter()
                .map(PathBuf::from)
                .collect(),
            settings.include_hidden,
        )
    }

    /// Recursively collects audio files below `dir_path`.
    ///
    /// Unreadable subdirectories are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` if `dir_path` itself cannot be read.
    pub fn collect_audio_files(&self, dir_path: &Path) -> Result<Vec<PathBuf>, CatalogError> {
        let entries = read_dir(dir_path).map_err(|source| CatalogError::Io {
            path: dir_path.to_path_buf(),
            source,
        })?;

        let mut audio_files = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !self.include_hidden && is_hidden(&path) {
                continue;
            }

            if path.is_file() {
                if is_supported_audio_file(&path) {
                    audio_files.push(path);
                }
            } else if path.is_dir() {
                match self.collect_audio_files(&path) {
                    Ok(nested) => audio_files.extend(nested),
                    Err(e) => warn!("Skipping unreadable directory: {e}"),
                }
            }
        }

        Ok(audio_files)
    }
}

impl CatalogSource for DirectoryCatalogSource {
    fn fetch(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let mut files = Vec::new();
        let mut first_error = None;
        let mut readable_roots = 0;

        for dir in &self.directories {
            match self.collect_audio_files(dir) {
                Ok(found) => {
                    readable_roots += 1;
                    files.extend(found);
                }
                Err(e) => {
                    warn!("Library directory unavailable: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }

        if readable_roots == 0
            && let Some(e) = first_error
        {
            return Err(e);
        }

        files.sort();
        files.dedup();
        debug!("Found {} audio files", files.len());

        Ok(files.iter().map(|path| read_entry(path)).collect())
    }
}

/// Checks whether a path has a supported audio extension.
#[must_use]
pub fn is_supported_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|ext_str| {
            SUPPORTED_AUDIO_EXTENSIONS
                .iter()
                .any(|&ext| ext.eq_ignore_ascii_case(ext_str))
        })
}

/// Derives a stable, non-negative id from a path (FNV-1a 64).
#[must_use]
pub fn stable_id(path: &Path) -> TrackId {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in path.to_string_lossy().as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    i64::try_from(hash >> 1).unwrap_or_default()
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Builds a catalog entry for one file; unreadable tags leave fields empty.
fn read_entry(path: &Path) -> CatalogEntry {
    let (mut title, artist, album, duration_ms) =
        match Probe::open(path).and_then(|probe| probe.read()) {
            Ok(tagged_file) => {
                let tag = tagged_file
                    .primary_tag()
                    .or_else(|| tagged_file.first_tag());
                (
                    tag.and_then(|t| t.title().map(|s| s.to_string())),
                    tag.and_then(|t| t.artist().map(|s| s.to_string())),
                    tag.and_then(|t| t.album().map(|s| s.to_string())),
                    i64::try_from(tagged_file.properties().duration().as_millis())
                        .unwrap_or(i64::MAX),
                )
            }
            Err(e) => {
                debug!("No readable tags in {:?}: {e}", path);
                (None, None, None, 0)
            }
        };

    if title.as_deref().is_none_or(str::is_empty) {
        title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
    }

    let date_added = metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
        .and_then(|since| i64::try_from(since.as_secs()).ok())
        .unwrap_or(0);

    CatalogEntry {
        id: stable_id(path),
        title,
        path: path.to_string_lossy().into_owned(),
        duration_ms,
        date_added,
        album_id: path.parent().map(stable_id).unwrap_or_default(),
        artist,
        album,
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs::{create_dir, write},
        path::Path,
    };

    use tempfile::TempDir;

    use crate::{
        error::CatalogError,
        library::{
            catalog::CatalogSource,
            scanner::{DirectoryCatalogSource, is_supported_audio_file, stable_id},
        },
    };

    fn library() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root.join("first song.mp3"), b"").unwrap();
        write(root.join("notes.txt"), b"").unwrap();
        write(root.join(".hidden.flac"), b"").unwrap();
        create_dir(root.join("album")).unwrap();
        write(root.join("album").join("second.FLAC"), b"").unwrap();
        temp_dir
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_audio_file(Path::new("/a/b.flac")));
        assert!(is_supported_audio_file(Path::new("/a/b.MP3")));
        assert!(!is_supported_audio_file(Path::new("/a/b.txt")));
        assert!(!is_supported_audio_file(Path::new("/a/noext")));
    }

    #[test]
    fn test_stable_id_is_deterministic_and_non_negative() {
        let a = stable_id(Path::new("/music/a.mp3"));
        assert_eq!(a, stable_id(Path::new("/music/a.mp3")));
        assert_ne!(a, stable_id(Path::new("/music/b.mp3")));
        assert!(a >= 0);
    }

    #[test]
    fn test_fetch_walks_directories_and_skips_hidden() {
        let temp_dir = library();
        let source = DirectoryCatalogSource::new(vec![temp_dir.path().to_path_buf()], false);

        let entries = source.fetch().unwrap();
        let titles: Vec<_> = entries.iter().filter_map(|e| e.title.clone()).collect();
        assert_eq!(entries.len(), 2);
        assert!(titles.contains(&"first song".to_string()));
        assert!(titles.contains(&"second".to_string()));
        assert!(entries.iter().all(|e| e.artist.is_none()));
    }

    #[test]
    fn test_fetch_includes_hidden_when_configured() {
        let temp_dir = library();
        let source = DirectoryCatalogSource::new(vec![temp_dir.path().to_path_buf()], true);
        assert_eq!(source.fetch().unwrap().len(), 3);
    }

    #[test]
    fn test_tracks_in_same_directory_share_album_id() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path().join("a.mp3"), b"").unwrap();
        write(temp_dir.path().join("b.mp3"), b"").unwrap();
        let source = DirectoryCatalogSource::new(vec![temp_dir.path().to_path_buf()], false);

        let entries = source.fetch().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].album_id, entries[1].album_id);
        assert_ne!(entries[0].id, entries[1].id);
    }

    #[test]
    fn test_missing_root_is_an_error_only_when_all_roots_fail() {
        let temp_dir = library();
        let missing = temp_dir.path().join("does-not-exist");

        let only_missing = DirectoryCatalogSource::new(vec![missing.clone()], false);
        assert!(matches!(only_missing.fetch(), Err(CatalogError::Io { .. })));

        let mixed =
            DirectoryCatalogSource::new(vec![missing, temp_dir.path().to_path_buf()], false);
        assert_eq!(mixed.fetch().unwrap().len(), 2);
    }

    #[test]
    fn test_no_directories_yields_empty_catalog() {
        let source = DirectoryCatalogSource::new(vec![], false);
        assert!(source.fetch().unwrap().is_empty());
    }
}
