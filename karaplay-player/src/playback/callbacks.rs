//! Orchestrator callbacks
//!
//! One handler per event kind, last registration wins. Handlers run
//! synchronously inside the player's event handling, so they must return
//! quickly (typically by forwarding the event on a channel). Every invoked
//! event is also broadcast on the EventBus.

use karaplay_common::{EventBus, PlayerEvent, PlayerEventKind};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Handler of a domain event
pub type Callback = Arc<dyn Fn(&PlayerEvent) + Send + Sync>;

/// Registry of the orchestrator callbacks
pub struct CallbackRegistry {
    handlers: RwLock<HashMap<PlayerEventKind, Callback>>,
    bus: EventBus,
}

impl CallbackRegistry {
    pub fn new(bus: EventBus) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            bus,
        }
    }

    /// Assign the handler of an event kind
    pub fn set<F>(&self, kind: PlayerEventKind, handler: F)
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, Arc::new(handler));
    }

    /// Assign the handler of an event given by name (e.g. `"finished"`)
    pub fn set_by_name<F>(&self, name: &str, handler: F) -> karaplay_common::Result<()>
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        let kind = name.parse()?;
        self.set(kind, handler);
        Ok(())
    }

    pub fn get(&self, kind: PlayerEventKind) -> Option<Callback> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
    }

    pub fn is_set(&self, kind: PlayerEventKind) -> bool {
        self.get(kind).is_some()
    }

    /// Call the handler of the event, if any, and broadcast the event
    pub fn invoke(&self, event: PlayerEvent) {
        // Handler is cloned out so it runs without the registry lock
        match self.get(event.kind()) {
            Some(handler) => handler(&event),
            None => debug!("No callback set for '{}'", event.kind()),
        }
        self.bus.emit_lossy(event);
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new(EventBus::default())
    }
}
