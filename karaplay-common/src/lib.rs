//! # karaplay common library
//!
//! Shared code for the karaplay crates including:
//! - Player configuration (TOML) and config file resolution
//! - Domain event types (PlayerEvent enum) and the EventBus
//! - File path <-> media resource locator (MRL) conversion
//! - Media engine version parsing

pub mod config;
pub mod error;
pub mod events;
pub mod mrl;
pub mod version;

pub use error::{Error, Result};
pub use events::{EntryId, EventBus, PlayerEvent, PlayerEventKind};
pub use version::EngineVersion;
