//! Speech engines behind one contract.
//!
//! Both engines run a session as a spawned task and report back through a
//! [`SessionReporter`], which drops anything from a superseded generation.
//! Control calls (`pause`/`resume`/`stop`) name the generation they target
//! so a late call can never touch a newer session.

pub mod local;
pub mod remote;

use narrate_core::{EngineKind, Generation};

use crate::error::PlaybackError;
use crate::orchestrator::SessionReporter;

pub use local::LocalSynthesisEngine;
pub use remote::{RemoteSynthesisEngine, classify_response};

/// What one session should speak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    pub text: String,
    /// Voice for the remote engine. Ignored by the local engine.
    pub voice: Option<String>,
}

/// A speech backend driven by the orchestrator.
pub trait SpeechEngine: Send + Sync {
    fn kind(&self) -> EngineKind;

    /// Begin a session. Must return promptly: the work runs on a spawned
    /// task and every outcome goes through `reporter`.
    ///
    /// A start that arrives after a newer session's start, or for a
    /// generation that is no longer current, is ignored.
    fn start(&self, request: EngineRequest, reporter: SessionReporter) -> Result<(), PlaybackError>;

    fn pause(&self, generation: Generation);

    fn resume(&self, generation: Generation);

    /// Hard-cancel `generation`. Unknown or finished generations are ignored.
    fn stop(&self, generation: Generation);
}
