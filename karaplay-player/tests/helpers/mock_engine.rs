//! Scripted media engine
//!
//! Records every command it receives and lets tests fire native events by
//! hand, as the real engine would from its own threads.

use karaplay_player::engine::{
    Media, MediaEngine, MediaId, NativeEvent, NativeEventHandler, NativeEventKind,
};
use karaplay_player::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

/// Command received by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load(PathBuf),
    Play(MediaId),
    Pause,
    Resume,
    Stop,
    AudioTrackIds,
    SetAudioTrack(i32),
    AddAudioSlave(PathBuf),
    SetFullscreen(bool),
}

/// Snapshot of a media given to `play`
#[derive(Debug, Clone, PartialEq)]
pub struct PlayedMedia {
    pub id: MediaId,
    pub path: PathBuf,
    pub display_duration: Option<Duration>,
    pub subtitle: Option<PathBuf>,
    pub parameters: Vec<String>,
    pub audio_slaves: Vec<PathBuf>,
}

pub struct MockEngine {
    next_id: AtomicU64,
    calls: Mutex<Vec<EngineCall>>,
    played: Mutex<Vec<PlayedMedia>>,
    handlers: RwLock<HashMap<NativeEventKind, NativeEventHandler>>,
    playing: Mutex<Option<MediaId>>,
    track_ids: Mutex<Vec<i32>>,
    slave_track_id: Mutex<Option<i32>>,
    last_error: Mutex<Option<String>>,
    version: Mutex<String>,
    stop_delay: Mutex<Duration>,
    play_failures: Mutex<Vec<PathBuf>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
            played: Mutex::new(Vec::new()),
            handlers: RwLock::new(HashMap::new()),
            playing: Mutex::new(None),
            track_ids: Mutex::new(vec![0]),
            slave_track_id: Mutex::new(Some(2)),
            last_error: Mutex::new(None),
            version: Mutex::new("3.0.11.1 Vetinari".to_string()),
            stop_delay: Mutex::new(Duration::ZERO),
            play_failures: Mutex::new(Vec::new()),
        }
    }

    /// Embedded audio tracks reported for any media
    pub fn set_track_ids(&self, ids: Vec<i32>) {
        *self.track_ids.lock().unwrap() = ids;
    }

    /// Track id of an attached source; `None` means slaves are unsupported
    pub fn set_slave_track_id(&self, id: Option<i32>) {
        *self.slave_track_id.lock().unwrap() = id;
    }

    pub fn set_last_error(&self, message: &str) {
        *self.last_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn set_version(&self, version: &str) {
        *self.version.lock().unwrap() = version.to_string();
    }

    pub fn set_stop_delay(&self, delay: Duration) {
        *self.stop_delay.lock().unwrap() = delay;
    }

    /// Make the next play of the media at this path fail
    pub fn fail_next_play(&self, path: &Path) {
        self.play_failures.lock().unwrap().push(path.to_path_buf());
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn count_matching(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    pub fn played(&self) -> Vec<PlayedMedia> {
        self.played.lock().unwrap().clone()
    }

    pub fn last_played(&self) -> Option<PlayedMedia> {
        self.played.lock().unwrap().last().cloned()
    }

    /// Media currently playing
    pub fn playing(&self) -> Option<MediaId> {
        *self.playing.lock().unwrap()
    }

    /// Fire an event about the playing media
    pub fn fire(&self, kind: NativeEventKind) {
        self.fire_with(kind, self.playing());
    }

    pub fn fire_with(&self, kind: NativeEventKind, media: Option<MediaId>) {
        let handlers = self.handlers.read().unwrap();
        if let Some(handler) = handlers.get(&kind) {
            handler(NativeEvent::new(kind, media));
        }
    }

    pub fn has_handlers(&self) -> bool {
        let handlers = self.handlers.read().unwrap();
        NativeEventKind::ALL.iter().all(|kind| handlers.contains_key(kind))
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl MediaEngine for MockEngine {
    fn name(&self) -> &str {
        "Mock"
    }

    fn version(&self) -> String {
        self.version.lock().unwrap().clone()
    }

    fn minimum_version(&self) -> &str {
        "3.0.0"
    }

    fn load(&self, path: &Path) -> Result<Media> {
        self.record(EngineCall::Load(path.to_path_buf()));
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        Ok(Media::new(self.next_id.fetch_add(1, Ordering::Relaxed), path))
    }

    fn play(&self, media: &Media) -> Result<()> {
        self.record(EngineCall::Play(media.id()));
        {
            let mut failures = self.play_failures.lock().unwrap();
            if let Some(index) = failures.iter().position(|path| path == media.path()) {
                failures.remove(index);
                return Err(Error::Playback(format!(
                    "Cannot open '{}'",
                    media.path().display()
                )));
            }
        }
        self.played.lock().unwrap().push(PlayedMedia {
            id: media.id(),
            path: media.path().to_path_buf(),
            display_duration: media.display_duration,
            subtitle: media.subtitle.clone(),
            parameters: media.parameters.clone(),
            audio_slaves: media.audio_slaves.clone(),
        });
        *self.playing.lock().unwrap() = Some(media.id());
        Ok(())
    }

    fn pause(&self) {
        self.record(EngineCall::Pause);
    }

    fn resume(&self) {
        self.record(EngineCall::Resume);
    }

    fn stop(&self) {
        let delay = *self.stop_delay.lock().unwrap();
        std::thread::sleep(delay);
        self.record(EngineCall::Stop);
        *self.playing.lock().unwrap() = None;
    }

    fn timing(&self) -> Duration {
        Duration::from_secs(25)
    }

    fn is_paused(&self) -> bool {
        false
    }

    fn audio_track_ids(&self, _media: &Media) -> Result<Vec<i32>> {
        self.record(EngineCall::AudioTrackIds);
        Ok(self.track_ids.lock().unwrap().clone())
    }

    fn set_audio_track(&self, id: i32) -> Result<()> {
        self.record(EngineCall::SetAudioTrack(id));
        Ok(())
    }

    fn add_audio_slave(&self, media: &mut Media, path: &Path) -> Result<i32> {
        self.record(EngineCall::AddAudioSlave(path.to_path_buf()));
        match *self.slave_track_id.lock().unwrap() {
            Some(id) => {
                media.audio_slaves.push(path.to_path_buf());
                Ok(id)
            }
            None => Err(Error::EngineCapability(
                "secondary audio sources are not supported".to_string(),
            )),
        }
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        self.record(EngineCall::SetFullscreen(fullscreen));
    }

    fn register(&self, kind: NativeEventKind, handler: NativeEventHandler) {
        self.handlers.write().unwrap().insert(kind, handler);
    }

    fn last_error_message(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }
}
