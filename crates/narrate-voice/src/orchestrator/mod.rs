//! Playback orchestrator: the public façade over both engines.
//!
//! ```text
//!   Idle ──play()──▶ Requesting (remote) ──fetched──▶ Playing ──end──▶ Completed
//!    │                   │                             │  ▲
//!    └──play()──▶ Playing (local)                pause()  resume()
//!                        │                             ▼  │
//!                        └───────── stop() ──────▶ Stopped ◀── Paused
//!
//!   any failure: Errored, then Idle
//! ```
//!
//! Every `play()` issues a fresh generation. The previous session, if still
//! active, is marked `Stopped`, its resources are released and its engine
//! is told to stop; anything it reports afterwards is dropped.

mod shared;

use std::sync::Arc;

use narrate_core::{
    DocumentId, EngineKind, EntitlementPort, Generation, PlaybackEvent, PlaybackSession,
    PlaybackSnapshot, PlaybackStatus, ProgressSink,
};
use tokio::sync::{mpsc, watch};

use crate::engine::{EngineRequest, SpeechEngine};
use crate::error::PlaybackError;
use crate::resources::ResourceStats;
use crate::text_utils;

pub use shared::SessionReporter;
use shared::Shared;

/// Per-call options for [`PlaybackOrchestrator::play`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayOptions {
    /// Remote voice; falls back to the configured default.
    pub voice: Option<String>,
    /// Document whose reading progress should be saved.
    pub document_id: Option<DocumentId>,
}

impl PlayOptions {
    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    #[must_use]
    pub fn for_document(mut self, document_id: DocumentId) -> Self {
        self.document_id = Some(document_id);
        self
    }
}

/// Collaborators of the orchestrator.
pub struct PlaybackOrchestratorConfig {
    /// Always available.
    pub local: Arc<dyn SpeechEngine>,
    /// Premium engine; `None` when no remote service is configured.
    pub remote: Option<Arc<dyn SpeechEngine>>,
    pub entitlement: Arc<dyn EntitlementPort>,
    pub progress_sink: Arc<dyn ProgressSink>,
    /// Voice used when `PlayOptions::voice` is empty.
    pub default_voice: Option<String>,
}

/// Drives at most one authoritative playback at a time.
///
/// Must be created inside a Tokio runtime.
pub struct PlaybackOrchestrator {
    shared: Arc<Shared>,
    local: Arc<dyn SpeechEngine>,
    remote: Option<Arc<dyn SpeechEngine>>,
    entitlement: Arc<dyn EntitlementPort>,
    default_voice: Option<String>,
}

impl PlaybackOrchestrator {
    /// Create the orchestrator and the receiver for its events.
    pub fn new(config: PlaybackOrchestratorConfig) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (shared, events) = Shared::new(config.progress_sink);
        let orchestrator = Self {
            shared,
            local: config.local,
            remote: config.remote,
            entitlement: config.entitlement,
            default_voice: config.default_voice.filter(|v| !v.trim().is_empty()),
        };
        (orchestrator, events)
    }

    /// Start speaking `text`, superseding whatever is playing.
    ///
    /// Whitespace-only text is rejected before any generation is issued.
    /// Every other failure is reported through events and the snapshot.
    pub fn play(&self, text: &str, options: PlayOptions) -> Result<Generation, PlaybackError> {
        if !text_utils::is_speakable(text) {
            return Err(PlaybackError::EmptyText);
        }

        let voice = options
            .voice
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.default_voice.clone());
        let engine = self.select_engine(voice.is_some());

        let (generation, superseded) = {
            let mut guard = self.shared.lock();
            let superseded = guard
                .session()
                .filter(|session| session.status.is_active());
            if let Some(previous) = superseded {
                guard.transition(PlaybackStatus::Stopped);
                guard.release_all_for(previous.generation);
                tracing::info!(generation = %previous.generation, "Playback superseded");
            }

            let generation = self.shared.registry.begin();
            guard.install(
                PlaybackSession::new(generation, engine.kind()),
                options.document_id,
            );
            (generation, superseded)
        };

        // The old engine must let go of shared primitives before the new
        // session starts using them.
        if let Some(previous) = superseded {
            self.engine_for(previous.engine_kind)
                .stop(previous.generation);
        }

        tracing::info!(%generation, engine = ?engine.kind(), chars = text.len(), "Playback accepted");

        let reporter = SessionReporter::new(generation, Arc::clone(&self.shared));
        let request = EngineRequest {
            text: text.to_string(),
            voice,
        };
        if let Err(e) = engine.start(request, reporter.clone()) {
            reporter.failed(e);
        }
        Ok(generation)
    }

    /// Pause the current session. Only valid while `Playing`.
    pub fn pause(&self) {
        let Some(session) = self.transition_from(PlaybackStatus::Playing, PlaybackStatus::Paused)
        else {
            return;
        };
        self.engine_for(session.engine_kind)
            .pause(session.generation);
    }

    /// Resume a paused session. Only valid while `Paused`.
    pub fn resume(&self) {
        let Some(session) = self.transition_from(PlaybackStatus::Paused, PlaybackStatus::Playing)
        else {
            return;
        };
        self.engine_for(session.engine_kind)
            .resume(session.generation);
    }

    /// Hard-cancel the current session. No-op unless one is active.
    pub fn stop(&self) {
        let stopped = {
            let mut guard = self.shared.lock();
            let Some(session) = guard
                .session()
                .filter(|session| session.status.is_active())
            else {
                return;
            };
            self.shared.registry.invalidate_all();
            guard.transition(PlaybackStatus::Stopped);
            guard.release_all_for(session.generation);
            session
        };

        self.engine_for(stopped.engine_kind)
            .stop(stopped.generation);
        tracing::info!(generation = %stopped.generation, "Playback stopped");
    }

    /// Reactive view for the presentation layer.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.shared.subscribe()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.shared.snapshot()
    }

    /// The latest session, terminal or not.
    pub fn session(&self) -> Option<PlaybackSession> {
        self.shared.lock().session()
    }

    /// Resolve once `generation` reaches a terminal status.
    ///
    /// A superseded generation resolves as `Stopped`.
    pub async fn wait_until_settled(&self, generation: Generation) -> PlaybackStatus {
        let mut changes = self.shared.subscribe();
        loop {
            if let Some(status) = self.shared.lock().settled(generation) {
                return status;
            }
            if changes.changed().await.is_err() {
                return PlaybackStatus::Stopped;
            }
        }
    }

    /// Lifetime resource counters.
    pub fn resource_stats(&self) -> ResourceStats {
        self.shared.resource_stats()
    }

    /// Resources currently held on behalf of any session.
    pub fn tracked_resources(&self) -> usize {
        self.shared.tracked_resources()
    }

    /// Remote iff premium voice is allowed, a voice is known and a remote
    /// engine exists.
    fn select_engine(&self, has_voice: bool) -> Arc<dyn SpeechEngine> {
        match &self.remote {
            Some(remote) if has_voice && self.entitlement.premium_voice_allowed() => {
                Arc::clone(remote)
            }
            _ => Arc::clone(&self.local),
        }
    }

    fn engine_for(&self, kind: EngineKind) -> &Arc<dyn SpeechEngine> {
        match (kind, &self.remote) {
            (EngineKind::Remote, Some(remote)) => remote,
            _ => &self.local,
        }
    }

    /// Move the current session from `from` to `to`, returning it when the
    /// transition applied.
    fn transition_from(
        &self,
        from: PlaybackStatus,
        to: PlaybackStatus,
    ) -> Option<PlaybackSession> {
        let mut guard = self.shared.lock();
        let session = guard.session().filter(|session| session.status == from)?;
        if !self.shared.registry.is_current(session.generation) {
            return None;
        }
        guard.transition(to);
        Some(session)
    }
}

impl Drop for PlaybackOrchestrator {
    fn drop(&mut self) {
        self.stop();
    }
}
