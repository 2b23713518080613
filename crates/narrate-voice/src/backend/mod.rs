//! Platform primitive traits: the seams between the engines and the outside world.
//!
//! The engines never talk to HTTP, audio devices or speech programs
//! directly. They operate on trait objects so the platform side can be
//! swapped (and mocked in tests) without touching session logic.
//!
//! | Trait                    | Used by | Production implementation                  |
//! |--------------------------|---------|--------------------------------------------|
//! | [`SynthesisTransport`]   | remote  | [`http::HttpSynthesisTransport`]           |
//! | [`AudioElement`]         | remote  | `RodioAudioElement` (`rodio-output`)       |
//! | [`UtterancePrimitive`]   | local   | [`command::CommandUtterancePrimitive`]     |

pub mod command;
pub mod http;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::error::PlaybackError;
use crate::resources::AudioBlob;

// ── Remote synthesis ───────────────────────────────────────────────

/// Body of a remote synthesis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: String,
}

/// Raw answer from the remote service, before classification.
#[derive(Debug, Clone)]
pub struct SynthesisResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header, if present.
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Performs one remote synthesis round-trip.
///
/// Implementations only fail with [`PlaybackError::Network`] when the
/// request never completed; every HTTP answer, successful or not, is
/// returned as a [`SynthesisResponse`] for the engine to classify.
#[async_trait]
pub trait SynthesisTransport: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest)
    -> Result<SynthesisResponse, PlaybackError>;
}

// ── Audio output ───────────────────────────────────────────────────

/// Invoked once when the current source ends naturally (`Ok`) or fails
/// mid-playback (`Err`). Dropped uncalled when the source is stopped or
/// replaced.
pub type EndedCallback = Box<dyn FnOnce(Result<(), PlaybackError>) + Send + 'static>;

/// A reusable audio output element.
///
/// One element lives for the lifetime of the remote engine; each session
/// reassigns its source instead of creating a new element.
#[async_trait]
pub trait AudioElement: Send + Sync {
    /// Replace the current source, stopping whatever was playing.
    fn set_source(&self, source: AudioBlob, on_ended: EndedCallback) -> Result<(), PlaybackError>;

    /// Start output. Resolves once audio is actually playing, or with
    /// [`PlaybackError::PlaybackBlocked`] / [`PlaybackError::Synthesis`].
    async fn play(&self) -> Result<(), PlaybackError>;

    fn pause(&self);

    fn resume(&self);

    /// Stop output and drop the current source without firing its callback.
    fn stop(&self);
}

// ── On-device speech ───────────────────────────────────────────────

/// How an utterance ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceOutcome {
    /// Spoken to the end.
    Finished,
    /// Cut short by [`UtterancePrimitive::cancel`].
    Cancelled,
}

/// On-device speech that can voice one utterance at a time.
#[async_trait]
pub trait UtterancePrimitive: Send + Sync {
    /// Speak one utterance, resolving when it has been spoken or cancelled.
    async fn speak(&self, utterance: &str) -> Result<UtteranceOutcome, PlaybackError>;

    /// Cut the current utterance short. Synchronous: by the time this
    /// returns the primitive has been told to stop.
    fn cancel(&self);
}
