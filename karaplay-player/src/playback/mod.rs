//! Karaoke playback core
//!
//! - `entry`: playlist entries, per-stage data and stages
//! - `callbacks`: orchestrator callbacks registry
//! - `instrumental`: instrumental file/track resolution
//! - `player`: the playback state machine

pub mod callbacks;
pub mod entry;
pub mod instrumental;
pub mod player;

pub use callbacks::{Callback, CallbackRegistry};
pub use entry::{PlaylistEntry, PlaylistEntryData, Song, Stage};
pub use instrumental::{resolve_instrumental, InstrumentalLocator, SiblingFileLocator};
pub use player::{MediaPlayer, IDLE_RETRY_DELAY, PLAYER_CLOSING_DURATION};
