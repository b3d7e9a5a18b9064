//! Visual theme selection.
//!
//! Three fixed palettes; the selection persists by name in the theme
//! partition.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
    sync::Arc,
};

use {
    thiserror::Error,
    tracing::{debug, warn},
};

use crate::config::{Partition, PreferenceStore};

const THEME_KEY: &str = "selected_theme";

/// Available themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThemeType {
    /// Dark, green accents.
    #[default]
    Spotify,
    /// Light, red accents with gradients.
    AppleMusic,
    /// Translucent, blue accents.
    IosGlass,
}

/// Colors of one theme as `0xRRGGBB` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColors {
    pub primary: u32,
    pub primary_variant: u32,
    pub background: u32,
    pub surface: u32,
    pub on_background: u32,
    pub on_surface: u32,
    pub accent: u32,
    pub card_background: u32,
    pub use_gradient: bool,
    pub use_blur: bool,
    pub gradient_start: Option<u32>,
    pub gradient_end: Option<u32>,
}

impl ThemeType {
    /// Every theme in picker order.
    pub const ALL: [ThemeType; 3] = [
        ThemeType::Spotify,
        ThemeType::AppleMusic,
        ThemeType::IosGlass,
    ];

    /// Name shown in the theme picker.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            ThemeType::Spotify => "Spotify",
            ThemeType::AppleMusic => "Apple Music",
            ThemeType::IosGlass => "iOS Glass",
        }
    }

    /// One-line description shown under the name.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            ThemeType::Spotify => "Dark theme with green accents",
            ThemeType::AppleMusic => "Light theme with vibrant gradients",
            ThemeType::IosGlass => "Frosted glass effect with iOS design",
        }
    }

    /// Name under which the theme is persisted.
    #[must_use]
    pub fn storage_name(self) -> &'static str {
        match self {
            ThemeType::Spotify => "SPOTIFY",
            ThemeType::AppleMusic => "APPLE_MUSIC",
            ThemeType::IosGlass => "IOS_GLASS",
        }
    }

    /// Palette of the theme.
    #[must_use]
    pub fn colors(self) -> ThemeColors {
        match self {
            ThemeType::Spotify => ThemeColors {
                primary: 0x1DB954,
                primary_variant: 0x128C3E,
                background: 0x121212,
                surface: 0x1E1E1E,
                on_background: 0xFFFFFF,
                on_surface: 0xB3B3B3,
                accent: 0x1DB954,
                card_background: 0x1E1E1E,
                use_gradient: false,
                use_blur: false,
                gradient_start: None,
                gradient_end: None,
            },
            ThemeType::AppleMusic => ThemeColors {
                primary: 0xFC3C44,
                primary_variant: 0xC41E25,
                background: 0xFAFAFA,
                surface: 0xFFFFFF,
                on_background: 0x000000,
                on_surface: 0x666666,
                accent: 0xFC3C44,
                card_background: 0xFFFFFF,
                use_gradient: true,
                use_blur: false,
                gradient_start: Some(0xFFE5E7),
                gradient_end: Some(0xFFF5F6),
            },
            ThemeType::IosGlass => ThemeColors {
                primary: 0x007AFF,
                primary_variant: 0x0051D5,
                background: 0xF2F2F7,
                surface: 0xFFFFFF,
                on_background: 0x000000,
                on_surface: 0x3C3C43,
                accent: 0x007AFF,
                card_background: 0xF9F9FB,
                use_gradient: false,
                use_blur: true,
                gradient_start: None,
                gradient_end: None,
            },
        }
    }
}

impl Display for ThemeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.display_name())
    }
}

/// Error for an unrecognised stored theme name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown theme '{0}'")]
pub struct UnknownTheme(pub String);

impl FromStr for ThemeType {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemeType::ALL
            .into_iter()
            .find(|theme| theme.storage_name() == s)
            .ok_or_else(|| UnknownTheme(s.to_string()))
    }
}

/// Loads and saves the selected theme.
#[derive(Debug, Clone)]
pub struct ThemeManager {
    store: Arc<dyn PreferenceStore>,
}

impl ThemeManager {
    #[must_use]
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Stored theme, or the default when none or an unknown one is stored.
    #[must_use]
    pub fn theme(&self) -> ThemeType {
        match self.store.get_string(Partition::Theme, THEME_KEY) {
            Some(name) => name.parse().unwrap_or_else(|e| {
                warn!("Falling back to default theme: {e}");
                ThemeType::default()
            }),
            None => ThemeType::default(),
        }
    }

    /// Persists `theme` as the selection.
    pub fn save_theme(&self, theme: ThemeType) {
        match self
            .store
            .put_string(Partition::Theme, THEME_KEY, theme.storage_name())
        {
            Ok(()) => debug!("Saved theme {theme}"),
            Err(e) => warn!("Failed to persist theme {theme}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        config::{MemoryPreferenceStore, Partition, PreferenceStore},
        state::theme::{ThemeManager, ThemeType},
    };

    #[test]
    fn test_default_theme_is_spotify() {
        let manager = ThemeManager::new(Arc::new(MemoryPreferenceStore::new()));
        assert_eq!(manager.theme(), ThemeType::Spotify);
    }

    #[test]
    fn test_saved_theme_round_trips_by_storage_name() {
        let store = Arc::new(MemoryPreferenceStore::new());
        let manager = ThemeManager::new(store.clone());

        manager.save_theme(ThemeType::IosGlass);

        assert_eq!(
            store.get_string(Partition::Theme, "selected_theme").as_deref(),
            Some("IOS_GLASS")
        );
        assert_eq!(manager.theme(), ThemeType::IosGlass);
    }

    #[test]
    fn test_unknown_stored_name_falls_back_to_default() {
        let store = Arc::new(MemoryPreferenceStore::new());
        store
            .put_string(Partition::Theme, "selected_theme", "NEON")
            .unwrap();

        assert_eq!(ThemeManager::new(store).theme(), ThemeType::Spotify);
    }

    #[test]
    fn test_palettes_match_theme_traits() {
        let spotify = ThemeType::Spotify.colors();
        assert_eq!(spotify.primary, 0x1DB954);
        assert_eq!(spotify.background, 0x121212);

        let apple = ThemeType::AppleMusic.colors();
        assert!(apple.use_gradient);
        assert_eq!(apple.gradient_start, Some(0xFFE5E7));
        assert_eq!(apple.gradient_end, Some(0xFFF5F6));

        let glass = ThemeType::IosGlass.colors();
        assert!(glass.use_blur);
        assert!(glass.gradient_start.is_none());
    }

    #[test]
    fn test_names() {
        assert_eq!(ThemeType::AppleMusic.to_string(), "Apple Music");
        assert_eq!(ThemeType::IosGlass.description(), "Frosted glass effect with iOS design");
        assert_eq!("APPLE_MUSIC".parse(), Ok(ThemeType::AppleMusic));
        assert!("apple_music".parse::<ThemeType>().is_err());
    }
}
