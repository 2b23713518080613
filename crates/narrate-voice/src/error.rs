//! Playback error types.

use narrate_core::{PlaybackErrorKind, PlaybackFailure};

/// Errors that can end a playback session.
///
/// There is no automatic retry for any of these: recovering always takes
/// an explicit new `play()`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// Remote synthesis answered with a non-success status.
    #[error("Synthesis provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    /// Remote synthesis answered with something that is not audio.
    #[error("Expected an audio payload, got content type '{content_type}'")]
    ContentType { content_type: String },

    /// Remote synthesis answered with a zero-length payload.
    #[error("Synthesis provider returned empty audio")]
    EmptyAudio,

    /// The remote request never completed.
    #[error("Network error: {0}")]
    Network(String),

    /// The platform refused to start audio output.
    #[error("Audio playback was blocked: {0}")]
    PlaybackBlocked(String),

    /// Decoding the remote audio or on-device synthesis failed.
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    /// `play()` was called with empty or whitespace-only text.
    #[error("Nothing to speak: text is empty")]
    EmptyText,
}

impl PlaybackError {
    /// Classification for the presentation layer.
    pub const fn kind(&self) -> PlaybackErrorKind {
        match self {
            Self::Provider { .. } => PlaybackErrorKind::Provider,
            Self::ContentType { .. } => PlaybackErrorKind::ContentType,
            Self::EmptyAudio => PlaybackErrorKind::EmptyAudio,
            Self::Network(_) => PlaybackErrorKind::Network,
            Self::PlaybackBlocked(_) => PlaybackErrorKind::PlaybackBlocked,
            Self::Synthesis(_) => PlaybackErrorKind::Synthesis,
            Self::EmptyText => PlaybackErrorKind::EmptyText,
        }
    }

    /// Display form carried by events and the snapshot.
    pub fn to_failure(&self) -> PlaybackFailure {
        PlaybackFailure::new(self.kind(), self.to_string())
    }
}
