//! Orchestrator commands
//!
//! **Responsibilities:**
//! - Set the next playlist entry (load transition and song, instrumental)
//! - Play a stage
//! - Pause/resume
//! - Skip the current stage

use super::core::MediaPlayer;
use super::PlayerState;
use crate::engine::Media;
use crate::error::{Error, Result};
use crate::playback::entry::{PlaylistEntry, PlaylistEntryData, Stage};
use crate::playback::instrumental::resolve_instrumental;
use karaplay_common::PlayerEvent;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Delay before playing the idle screen again after a failure
pub const IDLE_RETRY_DELAY: Duration = Duration::from_secs(1);

impl MediaPlayer {
    /// Play the given entry: its transition screen first, then its song
    ///
    /// A missing song file is reported through the `error` and
    /// `could_not_play` callbacks and leaves the player untouched.
    pub async fn set_playlist_entry(&self, entry: PlaylistEntry) -> Result<()> {
        if self.stop.is_cancelled() {
            return Err(Error::Stopped);
        }

        let song_path = self.config.kara_folder.join(&entry.song.file_path);
        if !song_path.is_file() {
            error!("File not found '{}'", song_path.display());
            self.callbacks.invoke(PlayerEvent::Error {
                id: Some(entry.id),
                message: "File not found".to_string(),
            });
            self.callbacks.invoke(PlayerEvent::CouldNotPlay { id: entry.id });
            return Ok(());
        }

        let mut state = self.state.lock().await;

        let transition = self.load_transition_media(&state, &entry)?;

        let mut song_media = self.engine.load(&song_path)?;
        song_media.add_parameters(&self.config.engine.media_parameters);
        song_media.add_parameters(&self.config.engine.song_parameters);
        let mut song = PlaylistEntryData::with_media(song_media);

        if entry.use_instrumental {
            if self.config.instrumental.enabled {
                if let Err(e) = resolve_instrumental(
                    self.engine.as_ref(),
                    self.instrumental_locator.as_ref(),
                    &song_path,
                    &mut song,
                ) {
                    warn!(
                        "Unable to set up instrumental for '{}': {}",
                        song_path.display(),
                        e
                    );
                }
            } else {
                debug!("Instrumentals are disabled, playing '{}' as is", song_path.display());
            }
        }

        state.transition = PlaylistEntryData::with_media(transition);
        state.song = song;
        state.entry = Some(entry);

        self.play_locked(&mut state, Stage::Transition)
    }

    /// Play the media of a stage
    pub async fn play(&self, stage: Stage) -> Result<()> {
        let mut state = self.state.lock().await;
        self.play_locked(&mut state, stage)
    }

    /// Play a stage given by name (`transition`, `song` or `idle`)
    pub async fn play_stage(&self, name: &str) -> Result<()> {
        self.play(name.parse()?).await
    }

    /// Pause (`true`) or resume (`false`) the current media
    ///
    /// The idle screen cannot be paused. Requests matching the current pause
    /// state are ignored.
    pub async fn pause(&self, pause: bool) -> Result<()> {
        let mut state = self.state.lock().await;

        match state.active_stage() {
            None => {
                debug!("Nothing is playing, ignoring pause request");
                return Ok(());
            }
            Some(Stage::Idle) => {
                debug!("Idle screen cannot be paused");
                return Ok(());
            }
            Some(_) => {}
        }

        if state.pause_requested == pause {
            debug!("Player already {}", if pause { "paused" } else { "playing" });
            return Ok(());
        }

        state.pause_requested = pause;
        if pause {
            info!("Setting pause");
            self.engine.pause();
        } else {
            info!("Resuming playback");
            self.engine.resume();
        }

        Ok(())
    }

    /// Abandon the current stage and move on as if its media had ended
    pub async fn skip(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if !self.advance(&mut state) {
            warn!("Skip requested but nothing is playing");
        }
        Ok(())
    }

    pub(super) fn play_locked(&self, state: &mut PlayerState, stage: Stage) -> Result<()> {
        if self.stop.is_cancelled() {
            debug!("Player stopped, not playing {}", stage);
            return Ok(());
        }

        // An explicit play supersedes a scheduled one
        state.pending = None;

        if stage == Stage::Idle {
            state.idle = Some(self.load_idle_media(state)?);
        }

        let id = {
            let media = state.media(stage).ok_or_else(|| {
                Error::InvalidState(format!("No media loaded for the {} stage", stage))
            })?;
            self.engine.play(media)?;
            media.id()
        };

        state.current = Some(id);
        state.remember(id);
        state.paused = None;
        state.pause_requested = false;
        Ok(())
    }

    /// Move on from the active stage
    ///
    /// Transition: the song is scheduled. Song: released and reported
    /// finished. Idle: restart scheduled. Returns false when no stage is
    /// active.
    pub(super) fn advance(&self, state: &mut PlayerState) -> bool {
        let Some(stage) = state.active_stage() else {
            return false;
        };

        match stage {
            Stage::Transition => {
                debug!("Will play '{}'", state.song_path());
                self.schedule(state, Stage::Song, None);
            }
            Stage::Song => self.finish_song(state),
            Stage::Idle => {
                debug!("Restarting idle screen");
                self.schedule(state, Stage::Idle, None);
            }
        }

        true
    }

    /// Release the song and report the entry finished
    fn finish_song(&self, state: &mut PlayerState) {
        let id = state.entry_id();
        state.current = None;
        state.paused = None;
        state.pause_requested = false;
        state.clear_entry();
        match id {
            Some(id) => self.callbacks.invoke(PlayerEvent::Finished { id }),
            None => warn!("Song ended without a playlist entry"),
        }
    }

    /// Play a stage on a new task, after an optional delay
    ///
    /// The ended media is no longer current from now on, so its late events
    /// are stale and a second skip finds nothing to advance. The task gives
    /// up if another play happened in the meantime.
    pub(super) fn schedule(&self, state: &mut PlayerState, stage: Stage, delay: Option<Duration>) {
        state.current = None;
        state.pending = Some(stage);

        let self_clone = self.clone_handles();
        tokio::spawn(async move {
            if let Some(delay) = delay {
                tokio::select! {
                    _ = self_clone.stop.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let mut state = self_clone.state.lock().await;
            if state.pending != Some(stage) {
                debug!("{} is no longer scheduled, not playing it", stage);
                return;
            }

            if let Err(e) = self_clone.play_locked(&mut state, stage) {
                self_clone.recover_failed_play(&mut state, stage, e);
            }
        });
    }

    /// Get past a scheduled stage the engine could not play
    fn recover_failed_play(&self, state: &mut PlayerState, stage: Stage, e: Error) {
        error!("Unable to play {}: {}", stage, e);
        state.pending = None;
        self.callbacks.invoke(PlayerEvent::Error {
            id: state.entry_id(),
            message: e.to_string(),
        });

        match stage {
            Stage::Song => self.finish_song(state),
            Stage::Idle => {
                warn!("Retrying the idle screen in {:?}", IDLE_RETRY_DELAY);
                self.schedule(state, Stage::Idle, Some(IDLE_RETRY_DELAY));
            }
            Stage::Transition => {}
        }
    }

    fn load_transition_media(&self, state: &PlayerState, entry: &PlaylistEntry) -> Result<Media> {
        let background = self.background(state, Stage::Transition)?;
        let text = self.text_generator.create_text(
            Stage::Transition,
            Some(entry),
            &self.idle_info(),
        )?;

        let mut media = self.engine.load(background)?;
        media.display_duration = Some(self.config.durations.transition());
        media.subtitle = Some(text);
        media.add_parameters(&self.config.engine.media_parameters);
        media.add_parameters(&self.config.engine.transition_parameters);
        Ok(media)
    }

    fn load_idle_media(&self, state: &PlayerState) -> Result<Media> {
        let background = self.background(state, Stage::Idle)?;
        let text = self
            .text_generator
            .create_text(Stage::Idle, None, &self.idle_info())?;

        let mut media = self.engine.load(background)?;
        media.display_duration = Some(self.config.durations.idle());
        media.subtitle = Some(text);
        media.add_parameters(&self.config.engine.media_parameters);
        media.add_parameters(&self.config.engine.idle_parameters);
        Ok(media)
    }

    fn background<'a>(&self, state: &'a PlayerState, stage: Stage) -> Result<&'a Path> {
        state
            .backgrounds
            .as_ref()
            .and_then(|backgrounds| backgrounds.get(stage))
            .ok_or_else(|| Error::InvalidState("Backgrounds are not loaded".to_string()))
    }

    fn idle_info(&self) -> crate::text_generator::IdleInfo {
        self.idle_info
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}
