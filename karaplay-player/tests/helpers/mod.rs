//! Test helper modules for karaplay-player integration tests
//!
//! Provides reusable test infrastructure components:
//! - MockEngine: scripted media engine firing native events on demand
//! - Fixture: temporary kara folder with backgrounds, player construction
//! - Recorder: records orchestrator callbacks

#![allow(dead_code)]

pub mod fixture;
pub mod mock_engine;
pub mod recorder;

// Re-export commonly used types
pub use fixture::{entry, instrumental_entry, Fixture, TestPlayer};
pub use mock_engine::{EngineCall, MockEngine, PlayedMedia};
pub use recorder::{settle, wait_until, Recorder};
