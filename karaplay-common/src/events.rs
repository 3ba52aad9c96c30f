//! Event types for the karaplay event system
//!
//! Provides the domain events the player reports to its orchestrator and the
//! EventBus they are mirrored on.
//!
//! # Architecture
//!
//! - **Callbacks**: the player invokes one handler per event kind, synchronously
//! - **EventBus** (tokio::broadcast): every invoked event is also broadcast,
//!   timestamped, to any number of subscribers (logging, monitoring)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::Error;

/// Identifier of a playlist entry, unique per dequeue
pub type EntryId = u64;

/// Domain events reported by the player
///
/// `id` is optional on the events that can also happen while the idle screen
/// is playing (no entry loaded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// The transition screen of an entry actually started
    StartedTransition { id: EntryId },

    /// The song of an entry actually started
    StartedSong { id: EntryId },

    /// The entry could not be played at all (e.g. missing file)
    CouldNotPlay { id: EntryId },

    /// The song of an entry reached its end
    Finished { id: EntryId },

    /// Playback was paused
    Paused {
        id: Option<EntryId>,
        /// Position in the current media
        timing: Duration,
    },

    /// Playback was resumed after a pause
    Resumed {
        id: Option<EntryId>,
        /// Position in the current media
        timing: Duration,
    },

    /// An error happened while handling the entry
    Error {
        id: Option<EntryId>,
        message: String,
    },
}

impl PlayerEvent {
    /// Kind of the event, used as the callback registry key
    pub fn kind(&self) -> PlayerEventKind {
        match self {
            PlayerEvent::StartedTransition { .. } => PlayerEventKind::StartedTransition,
            PlayerEvent::StartedSong { .. } => PlayerEventKind::StartedSong,
            PlayerEvent::CouldNotPlay { .. } => PlayerEventKind::CouldNotPlay,
            PlayerEvent::Finished { .. } => PlayerEventKind::Finished,
            PlayerEvent::Paused { .. } => PlayerEventKind::Paused,
            PlayerEvent::Resumed { .. } => PlayerEventKind::Resumed,
            PlayerEvent::Error { .. } => PlayerEventKind::Error,
        }
    }

    /// Entry the event refers to, if any
    pub fn entry_id(&self) -> Option<EntryId> {
        match self {
            PlayerEvent::StartedTransition { id }
            | PlayerEvent::StartedSong { id }
            | PlayerEvent::CouldNotPlay { id }
            | PlayerEvent::Finished { id } => Some(*id),
            PlayerEvent::Paused { id, .. }
            | PlayerEvent::Resumed { id, .. }
            | PlayerEvent::Error { id, .. } => *id,
        }
    }
}

/// Names of the domain events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerEventKind {
    StartedTransition,
    StartedSong,
    CouldNotPlay,
    Finished,
    Paused,
    Resumed,
    Error,
}

impl PlayerEventKind {
    /// All event kinds, in declaration order
    pub const ALL: [PlayerEventKind; 7] = [
        PlayerEventKind::StartedTransition,
        PlayerEventKind::StartedSong,
        PlayerEventKind::CouldNotPlay,
        PlayerEventKind::Finished,
        PlayerEventKind::Paused,
        PlayerEventKind::Resumed,
        PlayerEventKind::Error,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PlayerEventKind::StartedTransition => "started_transition",
            PlayerEventKind::StartedSong => "started_song",
            PlayerEventKind::CouldNotPlay => "could_not_play",
            PlayerEventKind::Finished => "finished",
            PlayerEventKind::Paused => "paused",
            PlayerEventKind::Resumed => "resumed",
            PlayerEventKind::Error => "error",
        }
    }
}

impl fmt::Display for PlayerEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlayerEventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlayerEventKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown event name: {}", s)))
    }
}

/// Event as broadcast on the EventBus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerNotification {
    #[serde(flatten)]
    pub event: PlayerEvent,

    /// When the event was emitted
    pub timestamp: DateTime<Utc>,
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the player)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerNotification>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerNotification> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(PlayerNotification {
            event,
            timestamp: Utc::now(),
        });
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
