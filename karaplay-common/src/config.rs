//! Configuration loading and config file resolution
//!
//! The player is configured by a single TOML file. Every section is optional:
//! a missing file or a missing key falls back to built-in defaults, so the
//! player can start with nothing more than a kara folder on the command line.
//!
//! # Config File Resolution
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `KARAPLAY_CONFIG`
//! 3. `<config dir>/karaplay/player.toml` (platform config directory)
//! 4. No file: built-in defaults
//!
//! # Example
//!
//! ```toml
//! kara_folder = "/srv/karaoke"
//! fullscreen = true
//!
//! [durations]
//! transition_duration = 5
//!
//! [backgrounds]
//! directory = "/srv/karaoke/backgrounds"
//! idle_background_name = "night.png"
//!
//! [engine]
//! media_parameters = ["no-audio-time-stretch"]
//! ```

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable holding the config file path
pub const CONFIG_ENV_VAR: &str = "KARAPLAY_CONFIG";

/// Default duration of the transition screen, in seconds
pub const TRANSITION_DURATION: u64 = 10;

/// Default duration of one idle screen loop, in seconds
pub const IDLE_DURATION: u64 = 20;

/// Player configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PlayerConfig {
    /// Root folder of the karaoke files; song paths are relative to it
    pub kara_folder: PathBuf,

    /// Whether the engine should render fullscreen
    pub fullscreen: bool,

    /// Per-stage durations
    pub durations: DurationsConfig,

    /// Background images overrides
    pub backgrounds: BackgroundsConfig,

    /// Engine parameters
    pub engine: EngineConfig,

    /// Instrumental track handling
    pub instrumental: InstrumentalConfig,

    /// Fonts used by the generated subtitles
    pub fonts: FontsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Durations of the screens, in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DurationsConfig {
    pub transition_duration: u64,
    pub idle_duration: u64,
}

impl Default for DurationsConfig {
    fn default() -> Self {
        Self {
            transition_duration: TRANSITION_DURATION,
            idle_duration: IDLE_DURATION,
        }
    }
}

impl DurationsConfig {
    pub fn transition(&self) -> Duration {
        Duration::from_secs(self.transition_duration)
    }

    pub fn idle(&self) -> Duration {
        Duration::from_secs(self.idle_duration)
    }
}

/// Custom backgrounds
///
/// Names are looked up in `directory` first, then in the bundled default
/// directory.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BackgroundsConfig {
    pub directory: Option<PathBuf>,
    pub transition_background_name: Option<String>,
    pub idle_background_name: Option<String>,
}

/// Parameters passed through to the media engine
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Parameters used when the engine instance is created
    pub instance_parameters: Vec<String>,

    /// Parameters added to every loaded media
    pub media_parameters: Vec<String>,

    /// Parameters added to the transition media only
    pub transition_parameters: Vec<String>,

    /// Parameters added to the song media only
    pub song_parameters: Vec<String>,

    /// Parameters added to the idle media only
    pub idle_parameters: Vec<String>,
}

/// Instrumental handling
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InstrumentalConfig {
    /// When false, instrumental requests of entries are ignored
    pub enabled: bool,
}

impl Default for InstrumentalConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Fonts bundled with the subtitles
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FontsConfig {
    /// Directory of font files to install for the session
    pub directory: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl PlayerConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}

/// Config file resolution following the priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Platform config directory
///
/// Returns `None` when no config file is available.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|path| path.exists())
}

/// Get default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("karaplay").join("player.toml"))
}

/// Resolve and load the configuration
///
/// An explicitly requested file that cannot be read is an error; the absence
/// of any config file only yields a warning and the defaults.
pub fn load_config(cli_arg: Option<&Path>) -> Result<PlayerConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) => {
            info!("Loading config file {}", path.display());
            PlayerConfig::from_file(&path)
        }
        None => {
            warn!("No config file found, using built-in defaults");
            Ok(PlayerConfig::default())
        }
    }
}
