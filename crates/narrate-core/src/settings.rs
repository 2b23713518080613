//! Playback settings and validation.
//!
//! Pure domain types with no infrastructure dependencies. Adapters fill
//! these from flags, environment or a settings store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default speaking rate for the on-device engine, in words per minute.
pub const DEFAULT_LOCAL_RATE_WPM: u32 = 175;

/// Accepted on-device speaking rates.
const LOCAL_RATE_RANGE: std::ops::RangeInclusive<u32> = 80..=450;

/// Speech playback settings.
///
/// All fields are optional to support partial configuration and graceful
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Remote synthesis endpoint (`http://` or `https://`).
    pub remote_endpoint: Option<String>,

    /// Bearer token for the remote endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_api_key: Option<String>,

    /// Premium voice used when `play()` does not name one.
    pub remote_voice: Option<String>,

    /// Abort superseded remote requests instead of letting them finish.
    pub abort_superseded_requests: Option<bool>,

    /// Program used for on-device speech.
    pub local_program: Option<String>,

    /// Extra arguments passed to the on-device program before the text.
    pub local_args: Option<Vec<String>>,

    /// On-device speaking rate in words per minute.
    pub local_rate_wpm: Option<u32>,
}

impl PlaybackSettings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            abort_superseded_requests: Some(false),
            local_program: Some(default_local_program().to_string()),
            local_rate_wpm: Some(DEFAULT_LOCAL_RATE_WPM),
            ..Self::default()
        }
    }

    /// Whether superseded remote fetches are aborted.
    pub fn effective_abort_superseded(&self) -> bool {
        self.abort_superseded_requests.unwrap_or(false)
    }

    /// On-device program, falling back to the platform default.
    pub fn effective_local_program(&self) -> &str {
        self.local_program
            .as_deref()
            .unwrap_or(default_local_program())
    }

    /// On-device rate, falling back to [`DEFAULT_LOCAL_RATE_WPM`].
    pub fn effective_local_rate(&self) -> u32 {
        self.local_rate_wpm.unwrap_or(DEFAULT_LOCAL_RATE_WPM)
    }

    /// Whether a remote engine can be built from these settings.
    pub const fn has_remote_endpoint(&self) -> bool {
        self.remote_endpoint.is_some()
    }
}

/// Platform default on-device speech program.
pub const fn default_local_program() -> &'static str {
    if cfg!(target_os = "macos") {
        "say"
    } else {
        "espeak-ng"
    }
}

/// Settings validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Remote endpoint must start with http:// or https://, got '{0}'")]
    InvalidEndpoint(String),

    #[error("Voice name must not be empty")]
    EmptyVoice,

    #[error("Local program must not be empty")]
    EmptyProgram,

    #[error("Speaking rate {0} wpm is outside 80..=450")]
    RateOutOfRange(u32),
}

/// Validate settings, returning the first problem found.
pub fn validate_settings(settings: &PlaybackSettings) -> Result<(), SettingsError> {
    if let Some(ref endpoint) = settings.remote_endpoint {
        let endpoint = endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(SettingsError::InvalidEndpoint(endpoint.to_string()));
        }
    }

    if let Some(ref voice) = settings.remote_voice {
        if voice.trim().is_empty() {
            return Err(SettingsError::EmptyVoice);
        }
    }

    if let Some(ref program) = settings.local_program {
        if program.trim().is_empty() {
            return Err(SettingsError::EmptyProgram);
        }
    }

    if let Some(rate) = settings.local_rate_wpm {
        if !LOCAL_RATE_RANGE.contains(&rate) {
            return Err(SettingsError::RateOutOfRange(rate));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(validate_settings(&PlaybackSettings::with_defaults()), Ok(()));
        assert_eq!(validate_settings(&PlaybackSettings::default()), Ok(()));
    }

    #[test]
    fn defaults_keep_superseded_fetches() {
        let settings = PlaybackSettings::with_defaults();
        assert!(!settings.effective_abort_superseded());
        assert_eq!(settings.effective_local_rate(), DEFAULT_LOCAL_RATE_WPM);
        assert!(!settings.has_remote_endpoint());
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let settings = PlaybackSettings {
            remote_endpoint: Some("ftp://tts.example.com".to_string()),
            ..PlaybackSettings::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn rejects_blank_voice() {
        let settings = PlaybackSettings {
            remote_voice: Some("  ".to_string()),
            ..PlaybackSettings::default()
        };
        assert_eq!(validate_settings(&settings), Err(SettingsError::EmptyVoice));
    }

    #[test]
    fn rejects_rate_out_of_range() {
        let settings = PlaybackSettings {
            local_rate_wpm: Some(20),
            ..PlaybackSettings::default()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::RateOutOfRange(20))
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: PlaybackSettings =
            serde_json::from_str(r#"{ "remote_voice": "nova" }"#).unwrap();
        assert_eq!(settings.remote_voice.as_deref(), Some("nova"));
        assert!(settings.remote_endpoint.is_none());
        assert_eq!(settings.effective_local_program(), default_local_program());
    }

    #[test]
    fn api_key_is_not_serialized_when_absent() {
        let json = serde_json::to_string(&PlaybackSettings::default()).unwrap();
        assert!(!json.contains("remote_api_key"));
    }
}
