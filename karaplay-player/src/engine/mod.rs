//! Native media engine adapter
//!
//! **Responsibilities:**
//! - `MediaEngine` trait: the contract the playback core consumes (load, play,
//!   pause/resume/stop, timing, audio tracks, secondary audio sources, event
//!   registration)
//! - `Media`: a loaded, playable media handle with its per-stage options
//! - `NativeEvent`: the four lifecycle events an engine delivers
//!
//! Engines deliver events from their own threads. Registered handlers must
//! return quickly and must not call back into the engine.

mod headless;

pub use headless::HeadlessEngine;

use crate::error::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Identifier of a loaded media, unique per engine
pub type MediaId = u64;

/// Handler registered for a native event kind
pub type NativeEventHandler = Box<dyn Fn(NativeEvent) + Send + Sync>;

/// Lifecycle event kinds fired by an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeEventKind {
    /// The current media reached its end
    EndReached,
    /// Playback actually started (first start or resume)
    Playing,
    /// Playback was paused
    Paused,
    /// The current media failed
    Error,
}

impl NativeEventKind {
    pub const ALL: [NativeEventKind; 4] = [
        NativeEventKind::EndReached,
        NativeEventKind::Playing,
        NativeEventKind::Paused,
        NativeEventKind::Error,
    ];
}

/// Event delivered by an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeEvent {
    pub kind: NativeEventKind,

    /// Media the event is about, when the engine knows it
    pub media: Option<MediaId>,
}

impl NativeEvent {
    pub fn new(kind: NativeEventKind, media: Option<MediaId>) -> Self {
        Self { kind, media }
    }
}

/// A loaded media
///
/// Owned exclusively by whoever loaded it (the playback core keeps one per
/// stage); the engine only borrows it to start playback.
#[derive(Debug, PartialEq)]
pub struct Media {
    id: MediaId,
    path: PathBuf,

    /// How long a still image is displayed (images have no duration of their own)
    pub display_duration: Option<Duration>,

    /// Subtitle file rendered over the media
    pub subtitle: Option<PathBuf>,

    /// Engine-specific parameters
    pub parameters: Vec<String>,

    /// Secondary audio sources attached to the media
    pub audio_slaves: Vec<PathBuf>,
}

impl Media {
    pub fn new(id: MediaId, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            path: path.into(),
            display_duration: None,
            subtitle: None,
            parameters: Vec::new(),
            audio_slaves: Vec::new(),
        }
    }

    pub fn id(&self) -> MediaId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Media resource locator (`file://` URI) of the media
    pub fn mrl(&self) -> Result<String> {
        let absolute = std::path::absolute(&self.path)?;
        Ok(karaplay_common::mrl::path_to_mrl(&absolute)?)
    }

    pub fn add_parameters<I, S>(&mut self, parameters: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters.extend(parameters.into_iter().map(Into::into));
    }
}

/// Contract of a native media engine
pub trait MediaEngine: Send + Sync + 'static {
    /// Human readable engine name, used in logs and errors
    fn name(&self) -> &str;

    /// Raw version string as reported by the engine (e.g. "3.0.11 Vetinari")
    fn version(&self) -> String;

    /// Oldest supported version
    fn minimum_version(&self) -> &str;

    /// Load a file as playable media
    ///
    /// Fails with `Error::FileNotFound` if the path does not resolve.
    fn load(&self, path: &Path) -> Result<Media>;

    /// Start playing the media, replacing the current one
    fn play(&self, media: &Media) -> Result<()>;

    fn pause(&self);

    fn resume(&self);

    fn stop(&self);

    /// Position in the current media
    fn timing(&self) -> Duration;

    fn is_paused(&self) -> bool;

    /// Ids of the audio tracks embedded in the media, in declaration order
    fn audio_track_ids(&self, media: &Media) -> Result<Vec<i32>>;

    /// Select the audio track of the current media
    fn set_audio_track(&self, id: i32) -> Result<()>;

    /// Attach a secondary audio source to the media
    ///
    /// Returns the id of the audio track the source will have once the media
    /// plays. Fails with `Error::EngineCapability` when unsupported.
    fn add_audio_slave(&self, media: &mut Media, path: &Path) -> Result<i32>;

    fn set_fullscreen(&self, fullscreen: bool);

    /// Register the handler of an event kind (replaces any previous one)
    fn register(&self, kind: NativeEventKind, handler: NativeEventHandler);

    /// Message of the last playback error, if any
    fn last_error_message(&self) -> Option<String>;
}
