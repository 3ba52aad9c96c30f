//! Core media player - construction, load sequence and shutdown
//!
//! **Responsibilities:**
//! - MediaPlayer struct definition and construction
//! - Load sequence: kara folder check, text generator, backgrounds, engine
//!   version check, native event bridge, fullscreen
//! - Shutdown with a closing timeout

use super::PlayerState;
use crate::backgrounds::{default_backgrounds_directory, BackgroundLoader};
use crate::engine::{MediaEngine, NativeEvent, NativeEventKind};
use crate::error::{Error, Result};
use crate::playback::callbacks::CallbackRegistry;
use crate::playback::instrumental::{InstrumentalLocator, SiblingFileLocator};
use crate::playback::Stage;
use crate::text_generator::{IdleInfo, TextGenerator};
use karaplay_common::config::PlayerConfig;
use karaplay_common::{EngineVersion, EntryId, EventBus};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Time given to the engine to stop before giving up on it
pub const PLAYER_CLOSING_DURATION: Duration = Duration::from_secs(3);

/// Karaoke media player
///
/// Plays the transition screen then the song of each entry it is given, and
/// the idle screen when asked to. Cheap handles to the shared parts are
/// cloned into the tasks it spawns.
pub struct MediaPlayer {
    pub(super) engine: Arc<dyn MediaEngine>,
    pub(super) config: Arc<PlayerConfig>,
    pub(super) text_generator: Arc<dyn TextGenerator>,
    pub(super) instrumental_locator: Arc<dyn InstrumentalLocator>,
    pub(super) callbacks: Arc<CallbackRegistry>,

    /// Playback state; handlers and commands are serialized on it
    pub(super) state: Arc<Mutex<PlayerState>>,

    /// Global stop signal, shared with the owner
    pub(super) stop: CancellationToken,

    /// Fatal errors, for the owner to act upon
    pub(super) errors: mpsc::UnboundedSender<Error>,

    /// Bridge from the engine handlers to the event loop
    pub(super) native_tx: mpsc::UnboundedSender<NativeEvent>,

    /// Taken by the event loop on load
    pub(super) native_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<NativeEvent>>>>,

    /// Directory of the bundled backgrounds
    pub(super) backgrounds_directory: PathBuf,

    /// Notes shown on the idle screen, filled on load
    pub(super) idle_info: Arc<std::sync::RwLock<IdleInfo>>,
}

impl MediaPlayer {
    pub fn new(
        engine: Arc<dyn MediaEngine>,
        config: PlayerConfig,
        text_generator: Arc<dyn TextGenerator>,
        stop: CancellationToken,
        errors: mpsc::UnboundedSender<Error>,
    ) -> Self {
        let (native_tx, native_rx) = mpsc::unbounded_channel();

        Self {
            engine,
            config: Arc::new(config),
            text_generator,
            instrumental_locator: Arc::new(SiblingFileLocator),
            callbacks: Arc::new(CallbackRegistry::default()),
            state: Arc::new(Mutex::new(PlayerState::default())),
            stop,
            errors,
            native_tx,
            native_rx: Arc::new(Mutex::new(Some(native_rx))),
            backgrounds_directory: default_backgrounds_directory(),
            idle_info: Arc::new(std::sync::RwLock::new(IdleInfo::default())),
        }
    }

    pub fn with_instrumental_locator(mut self, locator: Arc<dyn InstrumentalLocator>) -> Self {
        self.instrumental_locator = locator;
        self
    }

    pub fn with_backgrounds_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.backgrounds_directory = directory.into();
        self
    }

    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.callbacks = Arc::new(CallbackRegistry::new(bus));
        self
    }

    /// Clone the shared handles for a spawned task
    pub(super) fn clone_handles(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            config: Arc::clone(&self.config),
            text_generator: Arc::clone(&self.text_generator),
            instrumental_locator: Arc::clone(&self.instrumental_locator),
            callbacks: Arc::clone(&self.callbacks),
            state: Arc::clone(&self.state),
            stop: self.stop.clone(),
            errors: self.errors.clone(),
            native_tx: self.native_tx.clone(),
            native_rx: Arc::clone(&self.native_rx),
            backgrounds_directory: self.backgrounds_directory.clone(),
            idle_info: Arc::clone(&self.idle_info),
        }
    }

    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn stop_token(&self) -> &CancellationToken {
        &self.stop
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Id of the entry being played, if any
    pub async fn current_entry(&self) -> Option<EntryId> {
        self.state.lock().await.entry_id()
    }

    /// Stage whose media the engine plays, if any
    pub async fn active_stage(&self) -> Option<Stage> {
        self.state.lock().await.active_stage()
    }

    /// Whether the engine reported the current stage paused
    pub async fn is_paused(&self) -> bool {
        self.state.lock().await.paused.is_some()
    }

    /// Selected audio track of the song stage
    pub async fn song_audio_track(&self) -> Option<i32> {
        self.state.lock().await.song.audio_track_id
    }

    /// Prepare the player
    ///
    /// Must be called once, before any playback. Every failure here is fatal.
    pub async fn load(&self) -> Result<()> {
        if !self.config.kara_folder.is_dir() {
            return Err(Error::KaraFolderNotFound(self.config.kara_folder.clone()));
        }

        self.text_generator.load()?;

        let backgrounds =
            BackgroundLoader::new(&self.config.backgrounds, &self.backgrounds_directory).load()?;
        self.state.lock().await.backgrounds = Some(backgrounds);

        let version = self.check_version()?;
        *self
            .idle_info
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = IdleInfo {
            notes: vec![
                format!("{} {}", self.engine.name(), version),
                format!("karaplay {}", env!("CARGO_PKG_VERSION")),
            ],
        };

        self.register_native_handlers();
        self.start_event_loop();

        self.engine.set_fullscreen(self.config.fullscreen);

        info!("{} {}", self.engine.name(), version);
        Ok(())
    }

    /// Check the engine is recent enough
    pub fn check_version(&self) -> Result<EngineVersion> {
        let engine = self.engine.name().to_string();
        let version = EngineVersion::parse(&self.engine.version())
            .map_err(|_| Error::VersionNotFound {
                engine: engine.clone(),
            })?;
        let minimum = EngineVersion::parse(self.engine.minimum_version())?;

        if version < minimum {
            return Err(Error::EngineTooOld {
                engine,
                version: version.to_string(),
                minimum: minimum.to_string(),
            });
        }

        Ok(version)
    }

    /// Bridge the native events to the event loop
    fn register_native_handlers(&self) {
        for kind in NativeEventKind::ALL {
            let tx = self.native_tx.clone();
            self.engine.register(
                kind,
                Box::new(move |event: NativeEvent| {
                    // Receiver is gone once the player stopped
                    let _ = tx.send(NativeEvent::new(kind, event.media));
                }),
            );
        }
        debug!("Native event handlers registered");
    }

    fn start_event_loop(&self) {
        let self_clone = self.clone_handles();
        tokio::spawn(async move {
            self_clone.native_event_loop().await;
        });
    }

    /// Stop the player and the engine
    ///
    /// The engine gets `timeout` to stop; past it, the player gives up on it
    /// with a warning.
    pub async fn shutdown(&self, timeout: Duration) {
        self.stop.cancel();

        let name = self.engine.name().to_string();
        let engine = Arc::clone(&self.engine);
        let stopping = tokio::task::spawn_blocking(move || engine.stop());

        match tokio::time::timeout(timeout, stopping).await {
            Ok(Ok(())) => info!("{} stopped", name),
            Ok(Err(e)) => error!("{} stop task failed: {}", name, e),
            Err(_) => warn!("{} takes too long to stop", name),
        }
    }

    /// Report a fatal inconsistency: set the stop signal and notify the owner once
    pub(super) fn invalid_state(&self, message: String) {
        error!("Invalid state: {}", message);
        if self.stop.is_cancelled() {
            return;
        }
        self.stop.cancel();
        let _ = self.errors.send(Error::InvalidState(message));
    }
}
