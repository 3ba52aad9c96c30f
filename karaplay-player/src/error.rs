//! Error types for karaplay-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//!
//! Errors fall in two groups:
//! - **Recovered locally** by the player (missing song file, engine without
//!   secondary audio support, playback failures): they are logged and reported
//!   through the `error` callback, the session continues.
//! - **Fatal** (invalid state, startup checks): they stop the player and are
//!   surfaced to the owning process.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for karaplay-player
#[derive(Error, Debug)]
pub enum Error {
    /// Kara folder configured but missing on disk
    #[error("Karaoke folder \"{}\" does not exist", .0.display())]
    KaraFolderNotFound(PathBuf),

    /// Media file missing on disk
    #[error("File not found '{}'", .0.display())]
    FileNotFound(PathBuf),

    /// No background image could be resolved for a screen
    #[error("Unable to find a background for {name} ('{}')", .path.display())]
    BackgroundNotFound { name: String, path: PathBuf },

    /// The engine lacks a capability the request needs
    #[error("Engine capability error: {0}")]
    EngineCapability(String),

    /// Engine version string could not be parsed
    #[error("Unable to get {engine} version")]
    VersionNotFound { engine: String },

    /// Engine version below the supported minimum
    #[error("{engine} is too old (version {version}, minimum {minimum})")]
    EngineTooOld {
        engine: String,
        version: String,
        minimum: String,
    },

    /// Native event or command inconsistent with the playback state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Unknown stage name for an action ("play", "generate text to")
    #[error("Unexpected action to {action}: {name}")]
    InvalidStage { action: &'static str, name: String },

    /// Engine failed to perform a playback command
    #[error("Playback error: {0}")]
    Playback(String),

    /// The stop signal is set, no new work is accepted
    #[error("Player is stopped")]
    Stopped,

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors from the common crate (config, MRL, version parsing)
    #[error(transparent)]
    Common(#[from] karaplay_common::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Feature not available on this operating system
    #[error("This operating system ({0}) is not currently supported")]
    UnsupportedPlatform(String),
}

/// Convenience Result type using karaplay-player Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the error must stop the player
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvalidState(_)
                | Error::KaraFolderNotFound(_)
                | Error::BackgroundNotFound { .. }
                | Error::VersionNotFound { .. }
                | Error::EngineTooOld { .. }
        )
    }
}
