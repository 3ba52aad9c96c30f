//! Background images of the transition and idle screens
//!
//! Each screen background is looked up, in order:
//! 1. custom directory, custom name
//! 2. custom directory, default name
//! 3. default directory, default name

use crate::error::{Error, Result};
use crate::playback::Stage;
use karaplay_common::config::BackgroundsConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default background names
pub const TRANSITION_BACKGROUND_NAME: &str = "transition.png";
pub const IDLE_BACKGROUND_NAME: &str = "idle.png";

/// Environment variable overriding the bundled backgrounds directory
pub const BACKGROUNDS_ENV_VAR: &str = "KARAPLAY_BACKGROUNDS";

/// Directory of the bundled backgrounds
///
/// `KARAPLAY_BACKGROUNDS` if set, else `<data dir>/karaplay/backgrounds`.
pub fn default_backgrounds_directory() -> PathBuf {
    if let Ok(path) = std::env::var(BACKGROUNDS_ENV_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    dirs::data_dir()
        .map(|d| d.join("karaplay").join("backgrounds"))
        .unwrap_or_else(|| PathBuf::from("backgrounds"))
}

/// Resolved backgrounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backgrounds {
    pub transition: PathBuf,
    pub idle: PathBuf,
}

impl Backgrounds {
    /// Background of a screen (the song has none)
    pub fn get(&self, stage: Stage) -> Option<&Path> {
        match stage {
            Stage::Transition => Some(&self.transition),
            Stage::Idle => Some(&self.idle),
            Stage::Song => None,
        }
    }
}

/// Resolves the backgrounds from the configuration
#[derive(Debug, Clone)]
pub struct BackgroundLoader {
    directory: Option<PathBuf>,
    transition_name: Option<String>,
    idle_name: Option<String>,
    default_directory: PathBuf,
}

impl BackgroundLoader {
    pub fn new(config: &BackgroundsConfig, default_directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: config.directory.clone(),
            transition_name: config.transition_background_name.clone(),
            idle_name: config.idle_background_name.clone(),
            default_directory: default_directory.into(),
        }
    }

    pub fn load(&self) -> Result<Backgrounds> {
        Ok(Backgrounds {
            transition: self.resolve(
                Stage::Transition,
                self.transition_name.as_deref(),
                TRANSITION_BACKGROUND_NAME,
            )?,
            idle: self.resolve(Stage::Idle, self.idle_name.as_deref(), IDLE_BACKGROUND_NAME)?,
        })
    }

    fn resolve(&self, stage: Stage, custom_name: Option<&str>, default_name: &str) -> Result<PathBuf> {
        let mut candidates = Vec::with_capacity(3);
        if let Some(directory) = &self.directory {
            if let Some(name) = custom_name {
                candidates.push(directory.join(name));
            }
            candidates.push(directory.join(default_name));
        }
        candidates.push(self.default_directory.join(default_name));

        match candidates.iter().find(|path| path.is_file()) {
            Some(path) => {
                debug!("Using background '{}' for {}", path.display(), stage);
                Ok(path.clone())
            }
            None => Err(Error::BackgroundNotFound {
                name: stage.name().to_string(),
                path: self.default_directory.join(default_name),
            }),
        }
    }
}
