//! CLI composition root.
//!
//! The only place where concrete transports, audio output and speech
//! programs are wired into the orchestrator. Handlers receive a ready
//! [`CliContext`].

use std::sync::Arc;

use narrate_core::{
    LoggingProgressSink, PlaybackEvent, PlaybackSettings, StaticEntitlement, validate_settings,
};
use narrate_voice::{
    CommandUtterancePrimitive, LocalSynthesisEngine, PlaybackOrchestrator,
    PlaybackOrchestratorConfig, SpeechEngine,
};
use tokio::sync::mpsc;

use crate::error::CliError;
use crate::parser::SettingsArgs;

/// Validated configuration for one CLI invocation.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub settings: PlaybackSettings,
    /// Premium voice entitlement.
    pub premium: bool,
}

impl CliConfig {
    /// Build and validate configuration from flags/environment.
    pub fn from_args(args: &SettingsArgs) -> Result<Self, CliError> {
        let defaults = PlaybackSettings::with_defaults();
        let settings = PlaybackSettings {
            remote_endpoint: args.endpoint.clone(),
            remote_api_key: args.api_key.clone(),
            remote_voice: args.voice.clone(),
            abort_superseded_requests: Some(args.abort_superseded),
            local_program: args.local_program.clone().or(defaults.local_program),
            local_args: (!args.local_args.is_empty()).then(|| args.local_args.clone()),
            local_rate_wpm: args.rate.or(defaults.local_rate_wpm),
        };
        validate_settings(&settings)?;
        Ok(Self {
            settings,
            premium: args.premium,
        })
    }
}

/// Everything a handler needs.
pub struct CliContext {
    pub orchestrator: PlaybackOrchestrator,
    pub events: mpsc::UnboundedReceiver<PlaybackEvent>,
    pub settings: PlaybackSettings,
    /// Whether a remote engine was wired in.
    pub remote_available: bool,
    pub premium: bool,
}

/// Wire the orchestrator from `config`. Must run inside the Tokio runtime.
pub fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    let settings = config.settings;

    let primitive = match settings.local_args.clone() {
        Some(args) => CommandUtterancePrimitive::new(settings.effective_local_program(), args),
        None => CommandUtterancePrimitive::with_rate(
            settings.effective_local_program(),
            settings.effective_local_rate(),
        ),
    };
    tracing::debug!(
        program = primitive.program(),
        args = ?primitive.args(),
        "On-device speech configured"
    );
    let local: Arc<dyn SpeechEngine> = Arc::new(LocalSynthesisEngine::new(Arc::new(primitive)));

    let remote = build_remote(&settings);
    let remote_available = remote.is_some();

    let (orchestrator, events) = PlaybackOrchestrator::new(PlaybackOrchestratorConfig {
        local,
        remote,
        entitlement: Arc::new(StaticEntitlement::new(config.premium)),
        progress_sink: Arc::new(LoggingProgressSink),
        default_voice: settings.remote_voice.clone(),
    });

    Ok(CliContext {
        orchestrator,
        events,
        settings,
        remote_available,
        premium: config.premium,
    })
}

#[cfg(feature = "audio")]
fn build_remote(settings: &PlaybackSettings) -> Option<Arc<dyn SpeechEngine>> {
    use narrate_voice::{HttpSynthesisTransport, RemoteSynthesisEngine, RodioAudioElement};

    let endpoint = settings.remote_endpoint.as_deref()?;
    let element = match RodioAudioElement::spawn() {
        Ok(element) => element,
        Err(e) => {
            tracing::warn!(error = %e, "No audio output; remote voice disabled");
            return None;
        }
    };

    let transport = HttpSynthesisTransport::new(endpoint, settings.remote_api_key.clone());
    let mut engine = RemoteSynthesisEngine::new(Arc::new(transport), Arc::new(element))
        .with_abort_superseded(settings.effective_abort_superseded());
    if let Some(ref voice) = settings.remote_voice {
        engine = engine.with_default_voice(voice.clone());
    }
    Some(Arc::new(engine))
}

#[cfg(not(feature = "audio"))]
fn build_remote(settings: &PlaybackSettings) -> Option<Arc<dyn SpeechEngine>> {
    if settings.has_remote_endpoint() {
        tracing::warn!("Built without the `audio` feature; remote voice disabled");
    }
    None
}
