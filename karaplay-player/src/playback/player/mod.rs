//! Karaoke media player - playback state machine
//!
//! **Module Structure:**
//! - `core.rs`: construction, load sequence (checks, event bridge), shutdown
//! - `commands.rs`: orchestrator commands (set entry, play, pause, skip)
//! - `handlers.rs`: native event loop and the four event handlers
//!
//! **Concurrency:**
//! The engine fires native events on its own threads; the registered bridge
//! handlers only push them on an unbounded channel. A single event loop task
//! drains the channel and handles each event under the state lock, which the
//! commands take as well, so events and commands never interleave. Follow-up
//! playback (next stage, idle restart) runs on freshly spawned tasks.

mod commands;
mod core;
mod handlers;

pub use self::commands::IDLE_RETRY_DELAY;
pub use self::core::{MediaPlayer, PLAYER_CLOSING_DURATION};

use super::entry::{PlaylistEntry, PlaylistEntryData, Stage};
use crate::backgrounds::Backgrounds;
use crate::engine::{Media, MediaId};
use karaplay_common::EntryId;
use std::collections::VecDeque;

/// Number of media ids remembered to recognize late native events
const RECENT_MEDIA_CAPACITY: usize = 8;

/// Playback state, guarded by the player lock
#[derive(Debug, Default)]
pub(super) struct PlayerState {
    /// Entry being played (transition or song)
    pub(super) entry: Option<PlaylistEntry>,

    pub(super) transition: PlaylistEntryData,
    pub(super) song: PlaylistEntryData,

    /// Idle media, reloaded each time the idle screen plays
    pub(super) idle: Option<Media>,

    /// Media last given to the engine
    pub(super) current: Option<MediaId>,

    /// Stage the engine reported paused
    pub(super) paused: Option<Stage>,

    /// Last pause state requested to the engine
    pub(super) pause_requested: bool,

    /// Stage scheduled to play on a spawned task, not given to the engine yet
    pub(super) pending: Option<Stage>,

    /// Media recently given to the engine, most recent last
    pub(super) recent: VecDeque<MediaId>,

    pub(super) backgrounds: Option<Backgrounds>,
}

impl PlayerState {
    pub(super) fn media(&self, stage: Stage) -> Option<&Media> {
        match stage {
            Stage::Transition => self.transition.media.as_ref(),
            Stage::Song => self.song.media.as_ref(),
            Stage::Idle => self.idle.as_ref(),
        }
    }

    pub(super) fn media_id(&self, stage: Stage) -> Option<MediaId> {
        self.media(stage).map(Media::id)
    }

    pub(super) fn data_mut(&mut self, stage: Stage) -> Option<&mut PlaylistEntryData> {
        match stage {
            Stage::Transition => Some(&mut self.transition),
            Stage::Song => Some(&mut self.song),
            Stage::Idle => None,
        }
    }

    /// Whether the engine currently plays the media of the stage
    pub(super) fn is_playing_this(&self, stage: Stage) -> bool {
        self.current.is_some() && self.current == self.media_id(stage)
    }

    /// First stage, in probe order, whose media is playing
    pub(super) fn active_stage(&self) -> Option<Stage> {
        Stage::PROBE_ORDER
            .into_iter()
            .find(|stage| self.is_playing_this(*stage))
    }

    /// Record a media given to the engine
    pub(super) fn remember(&mut self, id: MediaId) {
        self.recent.retain(|recent| *recent != id);
        if self.recent.len() == RECENT_MEDIA_CAPACITY {
            self.recent.pop_front();
        }
        self.recent.push_back(id);
    }

    /// Whether an event about this media was superseded
    ///
    /// Events of a media other than the current one are stale. Without a
    /// current media, only events of a media played before are.
    pub(super) fn is_stale(&self, media: Option<MediaId>) -> bool {
        let Some(media) = media else {
            return false;
        };
        match self.current {
            Some(current) => current != media,
            None => self.recent.contains(&media),
        }
    }

    pub(super) fn entry_id(&self) -> Option<EntryId> {
        self.entry.as_ref().map(|entry| entry.id)
    }

    /// Song path of the current entry, for logs
    pub(super) fn song_path(&self) -> String {
        self.song
            .media
            .as_ref()
            .map(|media| media.path().display().to_string())
            .unwrap_or_default()
    }

    /// Forget the current entry and its stages
    pub(super) fn clear_entry(&mut self) {
        self.entry = None;
        self.transition = PlaylistEntryData::default();
        self.song = PlaylistEntryData::default();
    }
}
