//! Native event handling
//!
//! **Responsibilities:**
//! - Event loop draining the native event channel
//! - end-reached, playing, paused and error handlers
//!
//! Stages are matched in probe order (transition, song, idle) against the
//! media last given to the engine. An event no stage accounts for is a fatal
//! inconsistency.

use super::core::MediaPlayer;
use super::PlayerState;
use crate::engine::{NativeEvent, NativeEventKind};
use crate::playback::entry::Stage;
use karaplay_common::PlayerEvent;
use tracing::{debug, error, info, warn};

impl MediaPlayer {
    /// Drain native events until the stop signal is set
    pub(super) async fn native_event_loop(&self) {
        // Take ownership of receiver (only one loop allowed)
        let mut rx = match self.native_rx.lock().await.take() {
            Some(rx) => rx,
            None => {
                error!("Native event receiver already taken!");
                return;
            }
        };

        debug!("Native event loop started");

        loop {
            tokio::select! {
                _ = self.stop.cancelled() => {
                    debug!("Native event loop stopped");
                    break;
                }
                event = rx.recv() => match event {
                    Some(event) => self.dispatch(event).await,
                    None => {
                        debug!("Native event channel closed");
                        break;
                    }
                },
            }
        }
    }

    async fn dispatch(&self, event: NativeEvent) {
        if self.stop.is_cancelled() {
            return;
        }

        let mut state = self.state.lock().await;

        // Events of a media ended or replaced in the meantime
        if state.is_stale(event.media) {
            debug!(
                "Ignoring {:?} of media {:?} (playing {:?})",
                event.kind, event.media, state.current
            );
            return;
        }

        if let (Some(stage), None) = (state.pending, event.media) {
            debug!("Ignoring {:?} while the {} is about to play", event.kind, stage);
            return;
        }

        match event.kind {
            NativeEventKind::EndReached => self.handle_end_reached(&mut state, event),
            NativeEventKind::Playing => self.handle_playing(&mut state, event),
            NativeEventKind::Paused => self.handle_paused(&mut state, event),
            NativeEventKind::Error => self.handle_encountered_error(&mut state, event),
        }
    }

    fn handle_end_reached(&self, state: &mut PlayerState, event: NativeEvent) {
        debug!("End reached callback called");

        if !self.advance(state) {
            self.invalid_state(format!(
                "End reached on an undeterminated state (media {:?})",
                event.media
            ));
        }
    }

    fn handle_playing(&self, state: &mut PlayerState, event: NativeEvent) {
        debug!("Playing callback called");

        let Some(stage) = state.active_stage() else {
            self.invalid_state(format!(
                "Playing on an undeterminated state (media {:?})",
                event.media
            ));
            return;
        };

        if state.paused == Some(stage) {
            state.paused = None;
            let timing = self.engine.timing();
            debug!("Resumed play");
            self.callbacks.invoke(PlayerEvent::Resumed {
                id: state.entry_id(),
                timing,
            });
            return;
        }

        match stage {
            Stage::Idle => debug!("Playing idle screen"),
            Stage::Transition | Stage::Song => {
                let Some(id) = state.entry_id() else {
                    self.invalid_state(format!("Playing the {} without a playlist entry", stage));
                    return;
                };
                let song_path = state.song_path();
                let Some(data) = state.data_mut(stage) else {
                    return;
                };

                if data.started {
                    debug!("Ignoring repeated start of the {}", stage);
                    return;
                }
                data.started = true;

                if stage == Stage::Transition {
                    info!("Playing transition for '{}'", song_path);
                    self.callbacks.invoke(PlayerEvent::StartedTransition { id });
                    return;
                }

                if let Some(track_id) = data.audio_track_id {
                    debug!("Requesting to play audio track {}", track_id);
                    if let Err(e) = self.engine.set_audio_track(track_id) {
                        warn!("Unable to select audio track {}: {}", track_id, e);
                    }
                }

                let title = state
                    .entry
                    .as_ref()
                    .map(|entry| entry.song.title.clone())
                    .unwrap_or_default();
                info!("Now playing '{}' ('{}')", title, song_path);
                self.callbacks.invoke(PlayerEvent::StartedSong { id });
            }
        }
    }

    fn handle_paused(&self, state: &mut PlayerState, _event: NativeEvent) {
        debug!("Paused callback called");

        if state.paused.is_some() {
            debug!("Ignoring repeated pause");
            return;
        }

        let Some(stage) = state.active_stage() else {
            warn!("Paused while nothing is playing");
            return;
        };

        state.paused = Some(stage);
        let timing = self.engine.timing();
        debug!("Paused");
        self.callbacks.invoke(PlayerEvent::Paused {
            id: state.entry_id(),
            timing,
        });
    }

    fn handle_encountered_error(&self, state: &mut PlayerState, event: NativeEvent) {
        debug!("Error callback called");

        let path = state
            .active_stage()
            .and_then(|stage| state.media(stage))
            .map(|media| media.path().display().to_string())
            .unwrap_or_default();
        error!("Unable to play '{}'", path);

        let message = self
            .engine
            .last_error_message()
            .unwrap_or_else(|| "Unable to play current song".to_string());
        self.callbacks.invoke(PlayerEvent::Error {
            id: state.entry_id(),
            message,
        });

        if !self.advance(state) {
            warn!("Error on media {:?} while nothing is playing", event.media);
        }
    }
}
