// Board presets and user preferences
// Persisted as TOML in the per-user config directory; no play statistics are kept

use directories::ProjectDirs;
use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access config file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("malformed config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Difficulty presets and custom settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Beginner,                    // 9x9, 10 mines
    Intermediate,                // 16x16, 40 mines
    Expert,                      // 16 rows x 30 columns, 99 mines
    Custom(usize, usize, usize), // rows, columns, mines
}

impl Serialize for Difficulty {
    /// Serialize difficulty by name; custom sizes live in their own fields
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> Result<Difficulty, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Difficulty::ALL
            .iter()
            .find(|d| d.name() == s)
            .copied()
            .ok_or_else(|| serde::de::Error::custom(format!("unknown difficulty {s:?}")))
    }
}

impl Difficulty {
    /// Presets in menu order; Custom is a placeholder filled from the config
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Expert,
        Difficulty::Custom(0, 0, 0),
    ];

    /// Board dimensions as (rows, columns, mines)
    pub fn params(&self) -> (usize, usize, usize) {
        match self {
            Difficulty::Beginner => (9, 9, 10),
            Difficulty::Intermediate => (16, 16, 40),
            Difficulty::Expert => (16, 30, 99),
            Difficulty::Custom(r, c, n) => (*r, *c, *n),
        }
    }

    /// Stable identifier used in the config file and as board title
    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Expert => "Expert",
            Difficulty::Custom(_, _, _) => "Custom",
        }
    }

    pub fn to_index(&self) -> usize {
        match self {
            Difficulty::Beginner => 0,
            Difficulty::Intermediate => 1,
            Difficulty::Expert => 2,
            Difficulty::Custom(_, _, _) => 3,
        }
    }

    pub fn from_index(i: usize, custom_rows: usize, custom_columns: usize, custom_mines: usize) -> Difficulty {
        match i {
            0 => Difficulty::Beginner,
            1 => Difficulty::Intermediate,
            2 => Difficulty::Expert,
            _ => Difficulty::Custom(custom_rows, custom_columns, custom_mines),
        }
    }
}

/// User preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,

    // Custom difficulty parameters
    pub custom_rows: usize,
    pub custom_columns: usize,
    pub custom_mines: usize,

    pub show_indicator: bool, // Mark the cursor cell with an arrow
    pub ascii_icons: bool,    // ASCII fallback glyphs
    pub debug: bool,          // Enable Ctrl+M / Ctrl+R while playing
}

impl Default for Config {
    fn default() -> Self {
        Config {
            difficulty: Difficulty::Beginner,
            custom_rows: 10,
            custom_columns: 10,
            custom_mines: 20,
            show_indicator: false,
            ascii_icons: false,
            debug: false,
        }
    }
}

impl Config {
    /// Board dimensions for the selected difficulty as (rows, columns, mines)
    pub fn board(&self) -> (usize, usize, usize) {
        self.difficulty.params()
    }

    /// Select a custom board, remembering its size for the options screen
    pub fn set_custom(&mut self, rows: usize, columns: usize, mines: usize) {
        self.custom_rows = rows;
        self.custom_columns = columns;
        self.custom_mines = mines;
        self.difficulty = Difficulty::Custom(rows, columns, mines);
    }

    /// Parse a TOML document, restoring Custom from the saved custom fields
    pub fn from_toml(s: &str) -> Result<Config, ConfigError> {
        let mut cfg: Config = toml::from_str(s)?;
        if matches!(cfg.difficulty, Difficulty::Custom(_, _, _)) {
            cfg.difficulty = Difficulty::Custom(cfg.custom_rows, cfg.custom_columns, cfg.custom_mines);
        }
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let s = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_toml(&s)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let s = self.to_toml()?;
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, s).map_err(io_err)?;
        debug!("config saved to {}", path.display());
        Ok(())
    }
}

/// Get the configuration file path
/// Uses the platform config directory (e.g. ~/.config/xtmines/xtmines.toml on Linux)
/// and falls back to the current directory when it is unavailable
pub fn config_path() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    let name = exe.file_stem().and_then(|s| s.to_str())?.to_string();
    match ProjectDirs::from("com", "xtmines", &name) {
        Some(proj) => Some(proj.config_dir().join(format!("{name}.toml"))),
        None => env::current_dir().ok().map(|dir| dir.join(format!("{name}.toml"))),
    }
}

/// Load configuration from disk, or create the default file if none exists
/// A broken file is reported and replaced by defaults for this run only
pub fn load_or_create_config(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    if path.exists() {
        match Config::load(path) {
            Ok(cfg) => {
                info!("config loaded from {}", path.display());
                return cfg;
            }
            Err(e) => {
                warn!("{e}; using defaults");
                return Config::default();
            }
        }
    }
    let cfg = Config::default();
    if let Err(e) = cfg.save(path) {
        warn!("{e}");
    }
    cfg
}
