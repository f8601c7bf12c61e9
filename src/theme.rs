//! Light/dark theme state.
//!
//! The chosen theme is a single key-value pair persisted between runs.  A
//! [`ThemeController`] owns the current value and writes every change through
//! its [`ThemeStore`].

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};

use crate::error::{Error, Result};
use crate::observability::THEME_TOGGLES;

/// Particle colours used with the light theme.
pub const LIGHT_PALETTE: [&str; 5] = ["#6366f1", "#8b5cf6", "#ec4899", "#10b981", "#06b6d4"];

/// Particle colours used with the dark theme.
pub const DARK_PALETTE: [&str; 5] = ["#818cf8", "#a78bfa", "#f472b6", "#34d399", "#22d3ee"];

/// A colour theme.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light background.
    #[default]
    Light,
    /// Dark background.
    Dark,
}

impl Theme {
    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// The theme matching a system "prefers dark" flag.
    pub fn from_preference(prefers_dark: bool) -> Self {
        if prefers_dark { Theme::Dark } else { Theme::Light }
    }

    /// Particle colours for this theme.
    pub fn palette(self) -> &'static [&'static str] {
        match self {
            Theme::Light => &LIGHT_PALETTE,
            Theme::Dark => &DARK_PALETTE,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("Invalid theme: {s}. Valid options: light, dark")),
        }
    }
}

/// Persistence for the chosen theme.
pub trait ThemeStore: Send {
    /// Returns the stored theme, if one was saved.
    fn load(&self) -> Result<Option<Theme>>;

    /// Stores `theme`, replacing any previous value.
    fn save(&self, theme: Theme) -> Result<()>;
}

/// Keeps the theme in memory only.
#[derive(Debug, Default)]
pub struct MemoryThemeStore {
    theme: Mutex<Option<Theme>>,
}

impl MemoryThemeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `theme`.
    pub fn with_theme(theme: Theme) -> Self {
        Self {
            theme: Mutex::new(Some(theme)),
        }
    }
}

impl ThemeStore for MemoryThemeStore {
    fn load(&self) -> Result<Option<Theme>> {
        Ok(*self.theme.lock().map_err(|_| Error::config("theme store poisoned"))?)
    }

    fn save(&self, theme: Theme) -> Result<()> {
        *self.theme.lock().map_err(|_| Error::config("theme store poisoned"))? = Some(theme);
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct ThemeFile {
    theme: Theme,
}

/// Stores the theme as `{"theme": "dark"}` in a JSON file.
#[derive(Debug, Clone)]
pub struct FileThemeStore {
    path: PathBuf,
}

impl FileThemeStore {
    /// Creates a store backed by `path`.  The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ThemeStore for FileThemeStore {
    fn load(&self) -> Result<Option<Theme>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Error::io("failed to open theme file", err)),
        };
        let stored: ThemeFile = from_reader(BufReader::new(file)).map_err(|err| {
            Error::serialization("failed to parse theme file", Some(Box::new(err)))
        })?;
        Ok(Some(stored.theme))
    }

    fn save(&self, theme: Theme) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|err| Error::io("failed to create theme directory", err))?;
        }
        let file = File::create(&self.path)
            .map_err(|err| Error::io("failed to create theme file", err))?;
        to_writer_pretty(BufWriter::new(file), &ThemeFile { theme }).map_err(|err| {
            Error::serialization("failed to serialize theme", Some(Box::new(err)))
        })
    }
}

/// Owns the active theme and persists every change.
pub struct ThemeController {
    current: Theme,
    store: Box<dyn ThemeStore>,
}

impl ThemeController {
    /// Pick the initial theme: the stored one if present, otherwise the
    /// system preference.  A store that cannot be read falls back to the
    /// system preference.
    pub fn init(store: Box<dyn ThemeStore>, system_prefers_dark: bool) -> Self {
        let current = match store.load() {
            Ok(Some(theme)) => theme,
            Ok(None) => Theme::from_preference(system_prefers_dark),
            Err(err) => {
                tracing::warn!(error = %err, "could not load saved theme");
                Theme::from_preference(system_prefers_dark)
            }
        };
        Self { current, store }
    }

    /// The active theme.
    pub fn current(&self) -> Theme {
        self.current
    }

    /// Persist `theme` and make it active.  A failed save leaves the current
    /// theme unchanged.
    pub fn apply(&mut self, theme: Theme) -> Result<()> {
        self.store.save(theme)?;
        self.current = theme;
        Ok(())
    }

    /// Flip the theme, persist it and return the new value.
    pub fn toggle(&mut self) -> Result<Theme> {
        THEME_TOGGLES.click();
        let next = self.current.toggled();
        self.apply(next)?;
        Ok(next)
    }

    /// Follow a change of the system colour-scheme preference.
    pub fn system_preference_changed(&mut self, prefers_dark: bool) -> Result<Theme> {
        let theme = Theme::from_preference(prefers_dark);
        self.apply(theme)?;
        Ok(theme)
    }
}

impl std::fmt::Debug for ThemeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeController")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Shares one memory store between a controller and the test.
    struct Shared(Arc<MemoryThemeStore>);

    impl ThemeStore for Shared {
        fn load(&self) -> Result<Option<Theme>> {
            self.0.load()
        }

        fn save(&self, theme: Theme) -> Result<()> {
            self.0.save(theme)
        }
    }

    #[test]
    fn theme_parse_and_display() {
        assert_eq!("dark".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!(" Light ".parse::<Theme>(), Ok(Theme::Light));
        assert!("sepia".parse::<Theme>().is_err());
        assert_eq!(Theme::Dark.to_string(), "dark");
    }

    #[test]
    fn palettes_differ_by_theme() {
        assert_eq!(Theme::Light.palette()[0], "#6366f1");
        assert_eq!(Theme::Dark.palette()[0], "#818cf8");
        assert_eq!(Theme::Light.palette().len(), Theme::Dark.palette().len());
    }

    #[test]
    fn double_toggle_returns_to_dark() {
        let mut controller = ThemeController::init(Box::new(MemoryThemeStore::new()), false);
        controller.apply(Theme::Dark).unwrap();
        controller.toggle().unwrap();
        controller.toggle().unwrap();
        assert_eq!(controller.current(), Theme::Dark);
    }

    #[test]
    fn odd_toggles_from_light_persist_dark() {
        let store = Arc::new(MemoryThemeStore::with_theme(Theme::Light));
        let mut controller = ThemeController::init(Box::new(Shared(store.clone())), true);
        assert_eq!(controller.current(), Theme::Light);

        for _ in 0..3 {
            controller.toggle().unwrap();
        }
        assert_eq!(store.load().unwrap(), Some(Theme::Dark));
    }

    #[test]
    fn init_uses_system_preference_when_nothing_saved() {
        let controller = ThemeController::init(Box::new(MemoryThemeStore::new()), true);
        assert_eq!(controller.current(), Theme::Dark);

        let controller = ThemeController::init(Box::new(MemoryThemeStore::new()), false);
        assert_eq!(controller.current(), Theme::Light);
    }

    #[test]
    fn system_preference_change_applies() {
        let mut controller = ThemeController::init(Box::new(MemoryThemeStore::new()), false);
        assert_eq!(controller.system_preference_changed(true).unwrap(), Theme::Dark);
        assert_eq!(controller.current(), Theme::Dark);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join("theme.json");
        let store = FileThemeStore::new(&path);
        assert_eq!(store.load().unwrap(), None);

        store.save(Theme::Dark).unwrap();
        assert_eq!(store.load().unwrap(), Some(Theme::Dark));

        let raw = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({"theme": "dark"}));
    }

    #[test]
    fn failed_save_keeps_current_theme() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let store = FileThemeStore::new(blocker.join("theme.json"));
        let mut controller = ThemeController::init(Box::new(store), false);
        assert_eq!(controller.current(), Theme::Light);

        assert!(controller.toggle().is_err());
        assert!(controller.apply(Theme::Dark).is_err());
        assert_eq!(controller.current(), Theme::Light);
    }

    #[test]
    fn corrupt_file_falls_back_to_preference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theme.json");
        fs::write(&path, "not json").unwrap();

        let store = FileThemeStore::new(&path);
        assert!(store.load().is_err());

        let controller = ThemeController::init(Box::new(store), true);
        assert_eq!(controller.current(), Theme::Dark);
    }
}
