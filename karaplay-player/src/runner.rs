//! Local playlist runner
//!
//! Feeds the player from a TOML playlist: the next entry is set each time
//! the previous one is finished or could not be played, and the idle screen
//! plays once the playlist is exhausted.
//!
//! ```toml
//! [[entries]]
//! title = "Song title"
//! file_path = "anime/song.mkv"
//! owner = "me"
//! use_instrumental = true
//! ```

use crate::error::{Error, Result};
use crate::playback::{MediaPlayer, PlaylistEntry, Song, Stage};
use karaplay_common::{EntryId, PlayerEventKind};
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Entry of a playlist file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaylistItem {
    pub title: String,
    pub file_path: PathBuf,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub use_instrumental: bool,
}

/// Playlist file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Playlist {
    #[serde(default)]
    pub entries: Vec<PlaylistItem>,
}

impl Playlist {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid playlist: {}", e)))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read playlist {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}

/// Plays a playlist, then the idle screen
pub struct PlaylistRunner {
    player: Arc<MediaPlayer>,
    queue: VecDeque<PlaylistItem>,
    next_id: EntryId,
}

impl PlaylistRunner {
    pub fn new(player: Arc<MediaPlayer>, playlist: Playlist) -> Self {
        Self {
            player,
            queue: playlist.entries.into(),
            next_id: 1,
        }
    }

    /// Entries not played yet
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Run until the player stops
    pub async fn run(mut self) -> Result<()> {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        for kind in [PlayerEventKind::Finished, PlayerEventKind::CouldNotPlay] {
            let done_tx = done_tx.clone();
            self.player.callbacks().set(kind, move |event| {
                if let Some(id) = event.entry_id() {
                    let _ = done_tx.send(id);
                }
            });
        }
        drop(done_tx);

        info!("Playlist runner started with {} entries", self.queue.len());
        self.play_next().await?;

        let stop = self.player.stop_token().clone();
        loop {
            tokio::select! {
                _ = stop.cancelled() => {
                    debug!("Playlist runner stopped");
                    break;
                }
                done = done_rx.recv() => match done {
                    Some(id) => {
                        debug!("Entry {} done", id);
                        self.play_next().await?;
                    }
                    None => break,
                },
            }
        }

        Ok(())
    }

    /// Set the next entry on the player, or play idle when none is left
    async fn play_next(&mut self) -> Result<()> {
        loop {
            if self.player.is_stopped() {
                return Ok(());
            }

            let Some(item) = self.queue.pop_front() else {
                info!("Playlist is empty, playing idle screen");
                return match self.player.play(Stage::Idle).await {
                    Err(Error::Stopped) => Ok(()),
                    other => other,
                };
            };

            let entry = PlaylistEntry {
                id: self.next_id,
                song: Song {
                    title: item.title,
                    file_path: item.file_path,
                },
                owner: item.owner,
                use_instrumental: item.use_instrumental,
            };
            self.next_id += 1;
            let id = entry.id;

            info!("Setting entry {} '{}'", id, entry.song.title);
            match self.player.set_playlist_entry(entry).await {
                Ok(()) | Err(Error::Stopped) => return Ok(()),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => error!("Unable to play entry {}: {}", id, e),
            }
        }
    }
}
