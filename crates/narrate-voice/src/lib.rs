//! Speech playback for narrate.
//!
//! Turns text into audible speech through one of two engines: a remote
//! synthesis service returning encoded audio, or an on-device speech
//! program speaking sentence by sentence. [`PlaybackOrchestrator`] picks the
//! engine per `play()`, drives the session state machine and guarantees
//! that only the latest session ever changes observable state.
#![deny(unused_crate_dependencies)]

#[cfg(feature = "rodio-output")]
pub mod audio_thread;
pub mod backend;
pub mod engine;
pub mod error;
pub mod orchestrator;
#[cfg(feature = "rodio-output")]
pub mod playback;
pub mod registry;
pub mod resources;
pub mod text_utils;

#[cfg(feature = "rodio-output")]
pub use audio_thread::RodioAudioElement;
pub use backend::command::CommandUtterancePrimitive;
pub use backend::http::HttpSynthesisTransport;
pub use backend::{
    AudioElement, EndedCallback, SynthesisRequest, SynthesisResponse, SynthesisTransport,
    UtteranceOutcome, UtterancePrimitive,
};
pub use engine::{EngineRequest, LocalSynthesisEngine, RemoteSynthesisEngine, SpeechEngine};
pub use error::PlaybackError;
pub use orchestrator::{
    PlayOptions, PlaybackOrchestrator, PlaybackOrchestratorConfig, SessionReporter,
};
pub use registry::SessionRegistry;
pub use resources::{AudioBlob, AudioResource, ResourceId, ResourceManager, ResourceStats};
