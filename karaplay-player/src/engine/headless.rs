//! Headless media engine
//!
//! Engine that renders nothing but keeps time: a media "plays" for its
//! duration and the engine fires the same lifecycle events a real player
//! would. Used for unattended runs and smoke tests of a kara folder.
//!
//! # Durations
//!
//! - Audio/video containers symphonia can read: duration of the longest track
//! - Anything else with a display duration (still images): that duration
//! - Otherwise the media fails with an `Error` event
//!
//! # Event Delivery
//!
//! Each `play` starts a clock thread. Commands only queue events; the clock
//! thread delivers them, so handlers never run on the caller's thread.

use super::{Media, MediaEngine, MediaId, NativeEvent, NativeEventHandler, NativeEventKind};
use crate::error::{Error, Result};
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Clock resolution
const TICK: Duration = Duration::from_millis(20);

type Handlers = Arc<RwLock<HashMap<NativeEventKind, NativeEventHandler>>>;

/// Playback clock shared with the clock thread
#[derive(Default)]
struct Clock {
    /// Bumped on every play/stop; a clock thread exits when it no longer matches
    generation: u64,
    media: Option<MediaId>,
    duration: Option<Duration>,
    started_at: Option<Instant>,
    elapsed_before: Duration,
    paused: bool,
    audio_track: Option<i32>,
    pending: VecDeque<NativeEventKind>,
}

impl Clock {
    fn elapsed(&self) -> Duration {
        let running = match (self.paused, self.started_at) {
            (false, Some(started_at)) => started_at.elapsed(),
            _ => Duration::ZERO,
        };
        self.elapsed_before + running
    }
}

/// Result of probing a media file
struct Probe {
    duration: Option<Duration>,
    audio_tracks: Vec<i32>,
}

/// Engine keeping time without rendering anything
pub struct HeadlessEngine {
    next_id: AtomicU64,
    handlers: Handlers,
    clock: Arc<Mutex<Clock>>,
    last_error: Arc<Mutex<Option<String>>>,
    fullscreen: AtomicBool,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handlers: Arc::new(RwLock::new(HashMap::new())),
            clock: Arc::new(Mutex::new(Clock::default())),
            last_error: Arc::new(Mutex::new(None)),
            fullscreen: AtomicBool::new(false),
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.load(Ordering::Relaxed)
    }

    /// Audio track currently selected, if any
    pub fn audio_track(&self) -> Option<i32> {
        self.lock_clock().audio_track
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_last_error(&self, message: String) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(message);
    }

    /// Probe a file with symphonia
    ///
    /// Returns `None` for anything symphonia cannot read (images, unknown
    /// containers).
    fn probe(path: &Path) -> Option<Probe> {
        let file = File::open(path).ok()?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Create hint from file extension
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .ok()?;

        let tracks = probed.format.tracks();
        let audio_tracks = tracks
            .iter()
            .filter(|track| track.codec_params.codec != CODEC_TYPE_NULL)
            .map(|track| track.id as i32)
            .collect();

        let duration = tracks
            .iter()
            .filter_map(|track| {
                let params = &track.codec_params;
                let frames = params.n_frames?;
                match (params.time_base, params.sample_rate) {
                    (Some(time_base), _) => {
                        let time = time_base.calc_time(frames);
                        Some(Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac))
                    }
                    (None, Some(rate)) if rate > 0 => {
                        Some(Duration::from_secs_f64(frames as f64 / rate as f64))
                    }
                    _ => None,
                }
            })
            .max();

        Some(Probe {
            duration,
            audio_tracks,
        })
    }

    fn fire(handlers: &Handlers, event: NativeEvent) {
        let handlers = handlers.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(handler) = handlers.get(&event.kind) {
            handler(event);
        }
    }

    /// Clock thread of one playback
    fn run_clock(clock: Arc<Mutex<Clock>>, handlers: Handlers, generation: u64, media: MediaId) {
        loop {
            let (events, ended) = {
                let mut clock = clock.lock().unwrap_or_else(PoisonError::into_inner);
                if clock.generation != generation {
                    return;
                }
                let events: Vec<NativeEventKind> = clock.pending.drain(..).collect();
                let failed = events.contains(&NativeEventKind::Error);
                let ended = !failed
                    && !clock.paused
                    && clock.duration.is_some_and(|duration| clock.elapsed() >= duration);
                if failed || ended {
                    // Playback over: later commands must not reach this thread
                    clock.media = None;
                    clock.started_at = None;
                }
                (events, failed || ended)
            };

            for kind in events {
                Self::fire(&handlers, NativeEvent::new(kind, Some(media)));
            }

            if ended {
                if let Some(event) = Self::end_event(&clock, generation, media) {
                    Self::fire(&handlers, event);
                }
                return;
            }

            std::thread::sleep(TICK);
        }
    }

    /// End of playback: `EndReached` unless the media failed
    fn end_event(clock: &Arc<Mutex<Clock>>, generation: u64, media: MediaId) -> Option<NativeEvent> {
        let clock = clock.lock().unwrap_or_else(PoisonError::into_inner);
        if clock.generation != generation || clock.duration.is_none() {
            return None;
        }
        Some(NativeEvent::new(NativeEventKind::EndReached, Some(media)))
    }
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaEngine for HeadlessEngine {
    fn name(&self) -> &str {
        "Headless"
    }

    fn version(&self) -> String {
        format!("{} Headless", env!("CARGO_PKG_VERSION"))
    }

    fn minimum_version(&self) -> &str {
        "0.1"
    }

    fn load(&self, path: &Path) -> Result<Media> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let media = Media::new(self.next_id.fetch_add(1, Ordering::Relaxed), path);
        match media.mrl() {
            Ok(mrl) => debug!("Loaded media {} from {}", media.id(), mrl),
            Err(e) => debug!("Loaded media {} from '{}' ({})", media.id(), path.display(), e),
        }
        Ok(media)
    }

    fn play(&self, media: &Media) -> Result<()> {
        let duration = Self::probe(media.path())
            .and_then(|probe| probe.duration)
            .or(media.display_duration);

        let generation = {
            let mut clock = self.lock_clock();
            clock.generation += 1;
            clock.media = Some(media.id());
            clock.duration = duration;
            clock.started_at = Some(Instant::now());
            clock.elapsed_before = Duration::ZERO;
            clock.paused = false;
            clock.audio_track = None;
            clock.pending.clear();
            match duration {
                Some(_) => clock.pending.push_back(NativeEventKind::Playing),
                None => {
                    self.set_last_error(format!("Unable to read media '{}'", media.path().display()));
                    clock.pending.push_back(NativeEventKind::Error);
                }
            }
            clock.generation
        };

        let clock = Arc::clone(&self.clock);
        let handlers = Arc::clone(&self.handlers);
        let id = media.id();
        std::thread::Builder::new()
            .name(format!("headless-clock-{}", id))
            .spawn(move || Self::run_clock(clock, handlers, generation, id))?;

        Ok(())
    }

    fn pause(&self) {
        let mut clock = self.lock_clock();
        if clock.media.is_none() || clock.paused {
            return;
        }
        clock.elapsed_before = clock.elapsed();
        clock.paused = true;
        clock.pending.push_back(NativeEventKind::Paused);
    }

    fn resume(&self) {
        let mut clock = self.lock_clock();
        if clock.media.is_none() || !clock.paused {
            return;
        }
        clock.started_at = Some(Instant::now());
        clock.paused = false;
        clock.pending.push_back(NativeEventKind::Playing);
    }

    fn stop(&self) {
        let mut clock = self.lock_clock();
        clock.generation += 1;
        clock.media = None;
        clock.started_at = None;
        clock.paused = false;
        clock.pending.clear();
    }

    fn timing(&self) -> Duration {
        self.lock_clock().elapsed()
    }

    fn is_paused(&self) -> bool {
        self.lock_clock().paused
    }

    fn audio_track_ids(&self, media: &Media) -> Result<Vec<i32>> {
        if !media.path().exists() {
            return Err(Error::FileNotFound(media.path().to_path_buf()));
        }
        Ok(Self::probe(media.path())
            .map(|probe| probe.audio_tracks)
            .unwrap_or_default())
    }

    fn set_audio_track(&self, id: i32) -> Result<()> {
        let mut clock = self.lock_clock();
        if clock.media.is_none() {
            return Err(Error::Playback(format!(
                "Cannot select audio track {} without media",
                id
            )));
        }
        clock.audio_track = Some(id);
        Ok(())
    }

    fn add_audio_slave(&self, media: &mut Media, path: &Path) -> Result<i32> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        // Secondary sources are numbered after the embedded tracks
        let embedded = self.audio_track_ids(media)?;
        let id = embedded.iter().max().map_or(0, |max| max + 1) + media.audio_slaves.len() as i32;
        media.audio_slaves.push(path.to_path_buf());
        Ok(id)
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        if fullscreen {
            warn!("Headless engine has no display, fullscreen is ignored");
        }
        self.fullscreen.store(fullscreen, Ordering::Relaxed);
    }

    fn register(&self, kind: NativeEventKind, handler: NativeEventHandler) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, handler);
    }

    fn last_error_message(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn engine_with_channel() -> (HeadlessEngine, mpsc::Receiver<NativeEvent>) {
        let engine = HeadlessEngine::new();
        let (tx, rx) = mpsc::channel();
        for kind in NativeEventKind::ALL {
            let tx = tx.clone();
            engine.register(
                kind,
                Box::new(move |event| {
                    let _ = tx.send(event);
                }),
            );
        }
        (engine, rx)
    }

    fn image(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("background.png");
        std::fs::write(&path, b"not really a png").unwrap();
        path
    }

    #[test]
    fn test_load_missing_file() {
        let engine = HeadlessEngine::new();
        let result = engine.load(Path::new("/nonexistent/song.mkv"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_load_assigns_distinct_ids() {
        let dir = TempDir::new().unwrap();
        let path = image(&dir);
        let engine = HeadlessEngine::new();

        let first = engine.load(&path).unwrap();
        let second = engine.load(&path).unwrap();
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_image_plays_for_display_duration() {
        let dir = TempDir::new().unwrap();
        let (engine, rx) = engine_with_channel();
        let mut media = engine.load(&image(&dir)).unwrap();
        media.display_duration = Some(Duration::from_millis(100));

        engine.play(&media).unwrap();

        let playing = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(playing, NativeEvent::new(NativeEventKind::Playing, Some(media.id())));
        let ended = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(ended, NativeEvent::new(NativeEventKind::EndReached, Some(media.id())));
    }

    #[test]
    fn test_unreadable_media_fires_error() {
        let dir = TempDir::new().unwrap();
        let (engine, rx) = engine_with_channel();
        let media = engine.load(&image(&dir)).unwrap();

        engine.play(&media).unwrap();

        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event.kind, NativeEventKind::Error);
        assert!(engine.last_error_message().unwrap().contains("Unable to read media"));
        // No end reached after an error
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_pause_and_resume_fire_events_once() {
        let dir = TempDir::new().unwrap();
        let (engine, rx) = engine_with_channel();
        let mut media = engine.load(&image(&dir)).unwrap();
        media.display_duration = Some(Duration::from_secs(30));

        engine.play(&media).unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap().kind, NativeEventKind::Playing);

        engine.pause();
        engine.pause();
        assert!(engine.is_paused());
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap().kind, NativeEventKind::Paused);

        engine.resume();
        engine.resume();
        assert!(!engine.is_paused());
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap().kind, NativeEventKind::Playing);

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

        engine.set_audio_track(3).unwrap();
        assert_eq!(engine.audio_track(), Some(3));
        engine.stop();
        assert!(engine.set_audio_track(3).is_err());
    }

    #[test]
    fn test_fullscreen_and_version() {
        let engine = HeadlessEngine::new();
        engine.set_fullscreen(true);
        assert!(engine.is_fullscreen());

        let version = karaplay_common::EngineVersion::parse(&engine.version()).unwrap();
        let minimum = karaplay_common::EngineVersion::parse(engine.minimum_version()).unwrap();
        assert!(version >= minimum);
    }

    #[test]
    fn test_stop_silences_clock() {
        let dir = TempDir::new().unwrap();
        let (engine, rx) = engine_with_channel();
        let mut media = engine.load(&image(&dir)).unwrap();
        media.display_duration = Some(Duration::from_millis(150));

        engine.play(&media).unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap().kind, NativeEventKind::Playing);
        engine.stop();

        assert!(rx.recv_timeout(Duration::from_millis(400)).is_err());
    }

    #[test]
    fn test_audio_slave_track_id() {
        let dir = TempDir::new().unwrap();
        let engine = HeadlessEngine::new();
        let mut media = engine.load(&image(&dir)).unwrap();
        let audio = dir.path().join("background.ogg");
        std::fs::write(&audio, b"audio").unwrap();

        // No readable embedded track: the slave is track 0
        assert_eq!(engine.add_audio_slave(&mut media, &audio).unwrap(), 0);
        assert_eq!(media.audio_slaves, vec![audio]);
    }
}
