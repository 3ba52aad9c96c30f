//! Records the orchestrator callbacks of a player

use karaplay_common::{PlayerEvent, PlayerEventKind};
use karaplay_player::playback::MediaPlayer;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<PlayerEvent>>>,
}

impl Recorder {
    /// Register a recording callback for every event kind
    pub fn attach(player: &MediaPlayer) -> Self {
        let recorder = Self::default();
        for kind in PlayerEventKind::ALL {
            let events = Arc::clone(&recorder.events);
            player
                .callbacks()
                .set(kind, move |event| events.lock().unwrap().push(event.clone()));
        }
        recorder
    }

    pub fn events(&self) -> Vec<PlayerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<PlayerEventKind> {
        self.events().iter().map(PlayerEvent::kind).collect()
    }

    pub fn count(&self, kind: PlayerEventKind) -> usize {
        self.events().iter().filter(|event| event.kind() == kind).count()
    }
}

/// Poll a condition until it holds or two seconds elapse
pub async fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Let the event loop drain pending events
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
