//! Playlist entries and per-stage playback data

use crate::engine::{Media, MediaId};
use crate::error::{Error, Result};
use karaplay_common::EntryId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Song of a playlist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,

    /// Path of the song file, relative to the kara folder
    pub file_path: PathBuf,
}

/// Entry of the playlist, as supplied by the orchestrator
///
/// Immutable while it is played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub id: EntryId,
    pub song: Song,
    pub owner: String,
    #[serde(default)]
    pub use_instrumental: bool,
}

/// Mutable playback data of one stage of the current entry
#[derive(Debug, Default)]
pub struct PlaylistEntryData {
    /// Media of the stage, owned until the stage ends
    pub media: Option<Media>,

    /// Whether the start of the stage was already signaled
    pub started: bool,

    /// Audio track to select once the media plays (song stage only)
    pub audio_track_id: Option<i32>,
}

impl PlaylistEntryData {
    pub fn with_media(media: Media) -> Self {
        Self {
            media: Some(media),
            ..Default::default()
        }
    }

    pub fn media_id(&self) -> Option<MediaId> {
        self.media.as_ref().map(Media::id)
    }
}

/// Playback stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Screen announcing the next song
    Transition,
    /// The song itself
    Song,
    /// Looping screen shown while the playlist is empty
    Idle,
}

impl Stage {
    /// Order in which stages are matched against the playing media
    pub const PROBE_ORDER: [Stage; 3] = [Stage::Transition, Stage::Song, Stage::Idle];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Transition => "transition",
            Stage::Song => "song",
            Stage::Idle => "idle",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Stage::PROBE_ORDER
            .into_iter()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| Error::InvalidStage {
                action: "play",
                name: s.to_string(),
            })
    }
}
