//! Port definitions (trait abstractions) for external collaborators.
//!
//! The playback orchestrator only pushes progress and reads entitlement;
//! persistence and auth are owned elsewhere.
//!
//! # Design Rules
//!
//! - Ports use only domain types
//! - Every port ships a trivial implementation for tests and the CLI

pub mod entitlement;
pub mod progress_sink;

pub use entitlement::{EntitlementPort, StaticEntitlement};
pub use progress_sink::{LoggingProgressSink, NoopProgressSink, ProgressSink, ProgressSinkError};
