//! Events and reactive state exposed to the presentation layer.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "sentence_changed", "generation": 4, "index": 1 }
//! ```
//!
//! Every event carries the generation that produced it. The orchestrator
//! never emits events for a superseded generation except the single
//! `Stopped` transition issued when it is superseded.

use serde::{Deserialize, Serialize};

use crate::domain::{EngineKind, Generation, PlaybackStatus, ReadingProgress};

/// Classification of a playback failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackErrorKind {
    /// Remote service answered with a non-success status.
    Provider,
    /// Remote payload was not audio.
    ContentType,
    /// Remote payload was empty.
    EmptyAudio,
    /// Remote request never completed.
    Network,
    /// The platform refused to start audio output.
    PlaybackBlocked,
    /// Decoding or on-device synthesis failed.
    Synthesis,
    /// `play()` was called without speakable text.
    EmptyText,
}

/// Failure description suitable for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackFailure {
    pub kind: PlaybackErrorKind,
    pub message: String,
}

impl PlaybackFailure {
    pub fn new(kind: PlaybackErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Discrete notifications emitted by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// A session moved to a new status.
    StateChanged {
        generation: Generation,
        status: PlaybackStatus,
    },

    /// The local engine started speaking a new sentence (for highlighting).
    SentenceChanged { generation: Generation, index: usize },

    /// Read progress advanced.
    Progress {
        generation: Generation,
        progress: ReadingProgress,
    },

    /// The session failed. Followed by `StateChanged(Errored)` and
    /// `StateChanged(Idle)`.
    Failed {
        generation: Generation,
        error: PlaybackFailure,
    },
}

impl PlaybackEvent {
    /// The generation this event belongs to.
    pub const fn generation(&self) -> Generation {
        match self {
            Self::StateChanged { generation, .. }
            | Self::SentenceChanged { generation, .. }
            | Self::Progress { generation, .. }
            | Self::Failed { generation, .. } => *generation,
        }
    }
}

/// Reactive view of the orchestrator, published on every observable change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    /// Latest issued generation, if any playback was ever accepted.
    pub generation: Option<Generation>,
    /// Engine serving the latest session.
    pub engine: Option<EngineKind>,
    pub status: PlaybackStatus,
    pub is_playing: bool,
    pub is_paused: bool,
    /// Sentence currently being spoken by the local engine.
    pub current_sentence_index: Option<usize>,
    pub progress: Option<ReadingProgress>,
    /// Most recent failure of the current generation; cleared by `play()`.
    pub last_error: Option<PlaybackFailure>,
}

impl PlaybackSnapshot {
    /// Snapshot of an orchestrator that has never played anything.
    pub const fn idle() -> Self {
        Self {
            generation: None,
            engine: None,
            status: PlaybackStatus::Idle,
            is_playing: false,
            is_paused: false,
            current_sentence_index: None,
            progress: None,
            last_error: None,
        }
    }
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_wire_format_is_tagged() {
        let event = PlaybackEvent::SentenceChanged {
            generation: Generation::new(4),
            index: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "sentence_changed");
        assert_eq!(json["generation"], 4);
        assert_eq!(json["index"], 1);
    }

    #[test]
    fn state_changed_serializes_status_snake_case() {
        let event = PlaybackEvent::StateChanged {
            generation: Generation::new(1),
            status: PlaybackStatus::Requesting,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""status":"requesting""#), "{json}");
    }

    #[test]
    fn event_generation_accessor() {
        let event = PlaybackEvent::Failed {
            generation: Generation::new(9),
            error: PlaybackFailure::new(PlaybackErrorKind::Network, "offline"),
        };
        assert_eq!(event.generation(), Generation::new(9));
    }

    #[test]
    fn idle_snapshot_has_no_session() {
        let snapshot = PlaybackSnapshot::default();
        assert_eq!(snapshot.status, PlaybackStatus::Idle);
        assert!(snapshot.generation.is_none());
        assert!(!snapshot.is_playing);
        assert!(snapshot.last_error.is_none());
    }
}
