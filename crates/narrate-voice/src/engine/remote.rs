//! Remote engine: fetches encoded audio from a synthesis service and plays
//! it through one reusable audio element.
//!
//! A superseded fetch is normally left to finish; its result then fails the
//! generation check and the audio is released without being played. With
//! `abort_superseded` the fetch is dropped as soon as the session is stopped.

use std::sync::{Arc, Mutex, PoisonError};

use narrate_core::{EngineKind, Generation, ReadingProgress};
use tokio_util::sync::CancellationToken;

use super::{EngineRequest, SpeechEngine};
use crate::backend::{
    AudioElement, EndedCallback, SynthesisRequest, SynthesisResponse, SynthesisTransport,
};
use crate::error::PlaybackError;
use crate::orchestrator::SessionReporter;
use crate::resources::AudioBlob;
use crate::text_utils;

/// Turn a raw service answer into playable audio or a classified error.
pub fn classify_response(response: SynthesisResponse) -> Result<AudioBlob, PlaybackError> {
    if !(200..300).contains(&response.status) {
        return Err(PlaybackError::Provider {
            status: response.status,
            message: error_message(&response.body),
        });
    }

    let content_type = response.content_type.unwrap_or_default();
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !media_type.starts_with("audio/") {
        return Err(PlaybackError::ContentType { content_type });
    }

    if response.body.is_empty() {
        return Err(PlaybackError::EmptyAudio);
    }

    Ok(AudioBlob::new(response.body, media_type))
}

/// Reduce an error body to a message.
///
/// Understands `{"error": "..."}`, `{"error": {"message": "..."}}` and
/// `{"message": "..."}`; anything else is used as plain text.
fn error_message(body: &[u8]) -> String {
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(body) {
        let message = json
            .get("error")
            .and_then(|error| error.as_str().or_else(|| error.get("message")?.as_str()))
            .or_else(|| json.get("message")?.as_str());
        if let Some(message) = message {
            return message.to_string();
        }
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        "no error details".to_string()
    } else {
        text
    }
}

struct ActiveFetch {
    generation: Generation,
    cancel: CancellationToken,
}

/// High-fidelity synthesis through a remote service.
pub struct RemoteSynthesisEngine {
    transport: Arc<dyn SynthesisTransport>,
    element: Arc<dyn AudioElement>,
    default_voice: Option<String>,
    abort_superseded: bool,
    active: Mutex<Option<ActiveFetch>>,
}

impl RemoteSynthesisEngine {
    pub fn new(transport: Arc<dyn SynthesisTransport>, element: Arc<dyn AudioElement>) -> Self {
        Self {
            transport,
            element,
            default_voice: None,
            abort_superseded: false,
            active: Mutex::new(None),
        }
    }

    /// Voice used when a request names none.
    #[must_use]
    pub fn with_default_voice(mut self, voice: impl Into<String>) -> Self {
        self.default_voice = Some(voice.into());
        self
    }

    /// Drop in-flight fetches of stopped or superseded sessions.
    #[must_use]
    pub const fn with_abort_superseded(mut self, abort: bool) -> Self {
        self.abort_superseded = abort;
        self
    }

    fn is_active(&self, generation: Generation) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|fetch| fetch.generation == generation)
    }
}

impl SpeechEngine for RemoteSynthesisEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Remote
    }

    fn start(&self, request: EngineRequest, reporter: SessionReporter) -> Result<(), PlaybackError> {
        let voice = request
            .voice
            .or_else(|| self.default_voice.clone())
            .ok_or_else(|| PlaybackError::Synthesis("no remote voice configured".to_string()))?;

        let cancel = CancellationToken::new();
        let generation = reporter.generation();
        {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            let newer_running = active.as_ref().is_some_and(|f| f.generation > generation);
            if newer_running || !reporter.is_current() {
                tracing::debug!(%generation, "Ignored start of superseded session");
                return Ok(());
            }
            if let Some(previous) = active.replace(ActiveFetch {
                generation,
                cancel: cancel.clone(),
            }) {
                previous.cancel.cancel();
            }
        }

        let session = RemoteSession {
            request: SynthesisRequest {
                text: request.text,
                voice,
            },
            transport: Arc::clone(&self.transport),
            element: Arc::clone(&self.element),
            cancel: self.abort_superseded.then_some(cancel),
            reporter,
        };
        tokio::spawn(session.run());
        Ok(())
    }

    fn pause(&self, generation: Generation) {
        if self.is_active(generation) {
            self.element.pause();
        }
    }

    fn resume(&self, generation: Generation) {
        if self.is_active(generation) {
            self.element.resume();
        }
    }

    fn stop(&self, generation: Generation) {
        let stopped = {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            active.take_if(|fetch| fetch.generation == generation)
        };
        if let Some(fetch) = stopped {
            self.element.stop();
            fetch.cancel.cancel();
        }
    }
}

/// Everything one remote session task needs.
struct RemoteSession {
    request: SynthesisRequest,
    transport: Arc<dyn SynthesisTransport>,
    element: Arc<dyn AudioElement>,
    /// Present only when superseded fetches are aborted.
    cancel: Option<CancellationToken>,
    reporter: SessionReporter,
}

impl RemoteSession {
    async fn run(self) {
        let generation = self.reporter.generation();

        let response = match &self.cancel {
            Some(cancel) => tokio::select! {
                response = self.transport.synthesize(&self.request) => response,
                () = cancel.cancelled() => {
                    tracing::debug!(%generation, "Aborted remote fetch of stopped session");
                    return;
                }
            },
            None => self.transport.synthesize(&self.request).await,
        };

        let blob = match response.and_then(classify_response) {
            Ok(blob) => blob,
            Err(e) => {
                self.reporter.failed(e);
                return;
            }
        };

        // A stale session's blob is released inside `track`.
        if self.reporter.track(Box::new(blob.clone())).is_none() {
            return;
        }

        let spoken_chars = text_utils::spoken_len(&self.request.text);
        let on_ended: EndedCallback = {
            let reporter = self.reporter.clone();
            Box::new(move |result| match result {
                Ok(()) => {
                    reporter.progress(ReadingProgress::complete(spoken_chars));
                    reporter.completed();
                }
                Err(e) => reporter.failed(e),
            })
        };

        match self
            .reporter
            .run_if_current(|| self.element.set_source(blob, on_ended))
        {
            None => return,
            Some(Err(e)) => {
                self.reporter.failed(e);
                return;
            }
            Some(Ok(())) => {}
        }

        match self.element.play().await {
            Ok(()) => self.reporter.playing(),
            Err(e) => self.reporter.failed(e),
        }
    }
}
