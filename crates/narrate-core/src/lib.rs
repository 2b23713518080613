//! Core domain types and ports for narrate speech playback.
//!
//! This crate is transport-agnostic: it knows nothing about HTTP, audio
//! devices or speech engines. It defines
//!
//! - the session vocabulary (`Generation`, `EngineKind`, `PlaybackStatus`),
//! - reading progress handed to external persistence,
//! - the events and snapshot the presentation layer consumes,
//! - the ports the playback orchestrator depends on,
//! - playback settings and their validation.

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod ports;
pub mod settings;

pub use domain::{
    DocumentId, EngineKind, Generation, PlaybackSession, PlaybackStatus, ReadingProgress,
};
pub use events::{PlaybackErrorKind, PlaybackEvent, PlaybackFailure, PlaybackSnapshot};
pub use ports::{
    EntitlementPort, LoggingProgressSink, NoopProgressSink, ProgressSink, ProgressSinkError,
    StaticEntitlement,
};
pub use settings::{
    DEFAULT_LOCAL_RATE_WPM, PlaybackSettings, SettingsError, default_local_program,
    validate_settings,
};

// Dev-dependencies only used by some test modules
#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use tokio_test as _;
