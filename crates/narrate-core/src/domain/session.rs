//! Playback session identity and lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one playback attempt.
///
/// Generations are issued by the session registry in strictly increasing
/// order. Only the most recently issued generation is authoritative; any
/// async result tagged with an older generation is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    /// Wrap a raw generation number.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw generation number.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which speech backend serves a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Remote high-fidelity synthesis returning encoded audio.
    Remote,
    /// On-device synthesis speaking sentence by sentence.
    Local,
}

impl EngineKind {
    /// Short label for logs and the CLI.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
        }
    }
}

/// Lifecycle status of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    /// Nothing is playing.
    Idle,
    /// Waiting on the remote synthesis round-trip.
    Requesting,
    /// Audio is audible.
    Playing,
    /// Playback is held and can be resumed.
    Paused,
    /// Cancelled by `stop()` or superseded by a newer `play()`.
    Stopped,
    /// All text was spoken.
    Completed,
    /// An engine reported a failure.
    Errored,
}

impl PlaybackStatus {
    /// Terminal statuses are reached at most once per session and never left.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Completed | Self::Errored)
    }

    /// Statuses in which the session still owns resources or callbacks.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Requesting | Self::Playing | Self::Paused)
    }
}

/// One logical playback attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSession {
    pub generation: Generation,
    pub engine_kind: EngineKind,
    pub status: PlaybackStatus,
}

impl PlaybackSession {
    /// A freshly accepted session in its first status.
    pub const fn new(generation: Generation, engine_kind: EngineKind) -> Self {
        let status = match engine_kind {
            EngineKind::Remote => PlaybackStatus::Requesting,
            // No network round-trip, so local sessions start audible.
            EngineKind::Local => PlaybackStatus::Playing,
        };
        Self {
            generation,
            engine_kind,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(PlaybackStatus::Stopped.is_terminal());
        assert!(PlaybackStatus::Completed.is_terminal());
        assert!(PlaybackStatus::Errored.is_terminal());
        assert!(!PlaybackStatus::Idle.is_terminal());
        assert!(!PlaybackStatus::Paused.is_terminal());
    }

    #[test]
    fn idle_is_neither_terminal_nor_active() {
        assert!(!PlaybackStatus::Idle.is_active());
        assert!(!PlaybackStatus::Idle.is_terminal());
    }

    #[test]
    fn remote_sessions_start_requesting() {
        let session = PlaybackSession::new(Generation::new(3), EngineKind::Remote);
        assert_eq!(session.status, PlaybackStatus::Requesting);
    }

    #[test]
    fn local_sessions_start_playing() {
        let session = PlaybackSession::new(Generation::new(3), EngineKind::Local);
        assert_eq!(session.status, PlaybackStatus::Playing);
    }

    #[test]
    fn generations_order_by_value() {
        assert!(Generation::new(2) > Generation::new(1));
        assert_eq!(Generation::new(7).to_string(), "#7");
    }
}
