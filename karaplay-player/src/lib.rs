//! # karaplay player library (karaplay-player)
//!
//! Unattended karaoke playback: a transition screen announcing each entry,
//! then its song (optionally with its instrumental track), and an idle
//! screen while the playlist is empty.
//!
//! **Architecture:** a playback state machine (`playback::MediaPlayer`)
//! driving a native media engine (`engine::MediaEngine`) and reacting to its
//! asynchronous lifecycle events; orchestrator callbacks report progress.

pub mod backgrounds;
pub mod engine;
pub mod error;
pub mod fonts;
pub mod playback;
pub mod runner;
pub mod text_generator;

pub use error::{Error, Result};
pub use playback::MediaPlayer;
