//! CLI-specific error types and exit codes.

use narrate_core::{PlaybackErrorKind, PlaybackFailure, SettingsError};
use narrate_voice::PlaybackError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Playback ended in an error.
    #[error("Playback failed: {0}")]
    Playback(String),

    /// Audio output or speech program unavailable.
    #[error("Audio unavailable: {0}")]
    Unavailable(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Playback(_) => 1,
            Self::Arguments(_) => 2,    // EX_USAGE
            Self::Unavailable(_) => 69, // EX_UNAVAILABLE
            Self::Io(_) => 74,          // EX_IOERR
            Self::Config(_) => 78,      // EX_CONFIG
        }
    }
}

impl From<&PlaybackFailure> for CliError {
    /// A failure reported after playback was accepted.
    fn from(failure: &PlaybackFailure) -> Self {
        match failure.kind {
            PlaybackErrorKind::PlaybackBlocked => Self::Unavailable(failure.message.clone()),
            _ => Self::Playback(failure.message.clone()),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PlaybackError> for CliError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::EmptyText => Self::Arguments(err.to_string()),
            other => Self::Playback(other.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_errors_are_config_errors() {
        let err = CliError::from(SettingsError::RateOutOfRange(9));
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn empty_text_is_a_usage_error() {
        let err = CliError::from(PlaybackError::EmptyText);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn blocked_playback_failure_is_unavailable() {
        let failure = PlaybackFailure::new(PlaybackErrorKind::PlaybackBlocked, "no device");
        let err = CliError::from(&failure);
        assert_eq!(err.exit_code(), 69);
        assert!(err.to_string().contains("no device"));

        let failure = PlaybackFailure::new(PlaybackErrorKind::Provider, "quota");
        assert_eq!(CliError::from(&failure).exit_code(), 1);
    }

    #[test]
    fn provider_errors_are_general_failures() {
        let err = CliError::from(PlaybackError::Provider {
            status: 500,
            message: "boom".to_string(),
        });
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("boom"));
    }
}
