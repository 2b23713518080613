//! State shared between the orchestrator and engine tasks.
//!
//! Every observable mutation happens with the state lock held and only
//! after the registry confirms the generation is current, so a check can
//! never be overtaken by a concurrent `play()` or `stop()`.
//!
//! Lock order: `state`, then `resources`. Neither lock is held across an
//! `.await`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use narrate_core::{
    DocumentId, Generation, PlaybackEvent, PlaybackSession, PlaybackSnapshot, PlaybackStatus,
    ProgressSink, ReadingProgress,
};
use tokio::sync::{mpsc, watch};

use crate::error::PlaybackError;
use crate::registry::SessionRegistry;
use crate::resources::{AudioResource, ResourceId, ResourceManager, ResourceStats};

/// Settled outcomes kept for `wait_until_settled`.
const SETTLED_HISTORY: usize = 32;

pub(crate) struct State {
    pub(crate) session: Option<PlaybackSession>,
    document: Option<DocumentId>,
    settled: BTreeMap<Generation, PlaybackStatus>,
}

pub(crate) struct Shared {
    pub(crate) registry: SessionRegistry,
    state: Mutex<State>,
    resources: Mutex<ResourceManager>,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    snapshot: watch::Sender<PlaybackSnapshot>,
    progress_tx: mpsc::UnboundedSender<(DocumentId, ReadingProgress)>,
}

impl Shared {
    /// Build the shared state and spawn the progress forwarder.
    ///
    /// Progress is forwarded from a single task so the sink sees updates
    /// in the order they were produced.
    pub(crate) fn new(
        progress_sink: Arc<dyn ProgressSink>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (events, event_rx) = mpsc::unbounded_channel();
        let (progress_tx, mut progress_rx) =
            mpsc::unbounded_channel::<(DocumentId, ReadingProgress)>();

        tokio::spawn(async move {
            while let Some((document, progress)) = progress_rx.recv().await {
                if let Err(e) = progress_sink.save_progress(&document, progress).await {
                    tracing::warn!(%document, error = %e, "Failed to save reading progress");
                }
            }
        });

        let (snapshot, _) = watch::channel(PlaybackSnapshot::idle());
        let shared = Self {
            registry: SessionRegistry::new(),
            state: Mutex::new(State {
                session: None,
                document: None,
                settled: BTreeMap::new(),
            }),
            resources: Mutex::new(ResourceManager::new()),
            events,
            snapshot,
            progress_tx,
        };
        (Arc::new(shared), event_rx)
    }

    pub(crate) fn lock(&self) -> StateGuard<'_> {
        StateGuard {
            shared: self,
            state: self.state.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    fn resources(&self) -> MutexGuard<'_, ResourceManager> {
        self.resources.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot.subscribe()
    }

    pub(crate) fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn resource_stats(&self) -> ResourceStats {
        self.resources().stats()
    }

    pub(crate) fn tracked_resources(&self) -> usize {
        self.resources().tracked_count()
    }
}

/// Exclusive access to session state.
pub(crate) struct StateGuard<'a> {
    shared: &'a Shared,
    state: MutexGuard<'a, State>,
}

impl StateGuard<'_> {
    pub(crate) fn session(&self) -> Option<PlaybackSession> {
        self.state.session
    }

    /// Outcome of `generation` if it has settled.
    ///
    /// Generations older than the retained history count as `Stopped`.
    pub(crate) fn settled(&self, generation: Generation) -> Option<PlaybackStatus> {
        if let Some(status) = self.state.settled.get(&generation) {
            return Some(*status);
        }
        let oldest = self.state.settled.keys().next()?;
        (self.state.settled.len() >= SETTLED_HISTORY && generation < *oldest)
            .then_some(PlaybackStatus::Stopped)
    }

    /// Install a freshly begun session and reset the snapshot for it.
    pub(crate) fn install(&mut self, session: PlaybackSession, document: Option<DocumentId>) {
        self.state.session = Some(session);
        self.state.document = document;
        self.shared.snapshot.send_modify(|snapshot| {
            *snapshot = PlaybackSnapshot {
                generation: Some(session.generation),
                engine: Some(session.engine_kind),
                ..PlaybackSnapshot::idle()
            };
        });
        self.transition(session.status);
    }

    /// Move the installed session to `status`, publishing the change.
    pub(crate) fn transition(&mut self, status: PlaybackStatus) {
        let Some(session) = self.state.session.as_mut() else {
            return;
        };
        session.status = status;
        let generation = session.generation;
        tracing::debug!(%generation, ?status, "Playback state changed");

        if status.is_terminal() {
            self.state.settled.insert(generation, status);
            while self.state.settled.len() > SETTLED_HISTORY {
                self.state.settled.pop_first();
            }
        }

        self.publish_status(generation, status);
    }

    /// Publish a status on the snapshot and event stream without touching
    /// the session record (used for the `Idle` that follows `Errored`).
    fn publish_status(&self, generation: Generation, status: PlaybackStatus) {
        self.shared.snapshot.send_modify(|snapshot| {
            snapshot.status = status;
            snapshot.is_playing = status == PlaybackStatus::Playing;
            snapshot.is_paused = status == PlaybackStatus::Paused;
            if !status.is_active() {
                snapshot.current_sentence_index = None;
            }
        });
        self.emit(PlaybackEvent::StateChanged { generation, status });
    }

    fn emit(&self, event: PlaybackEvent) {
        // A dropped receiver only means nobody is listening.
        let _ = self.shared.events.send(event);
    }

    /// Release everything `generation` owns.
    pub(crate) fn release_all_for(&self, generation: Generation) -> usize {
        let released = self.shared.resources().release_all_for(generation);
        if released > 0 {
            tracing::debug!(%generation, released, "Released session resources");
        }
        released
    }
}

/// Callback handle an engine uses to report on one session.
///
/// Every method is a no-op once the generation is no longer current, so
/// engines can report unconditionally.
#[derive(Clone)]
pub struct SessionReporter {
    generation: Generation,
    shared: Arc<Shared>,
}

impl SessionReporter {
    pub(crate) const fn new(generation: Generation, shared: Arc<Shared>) -> Self {
        Self { generation, shared }
    }

    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Whether this session is still authoritative.
    pub fn is_current(&self) -> bool {
        self.shared.registry.is_current(self.generation)
    }

    /// Run `f` with the state lock held, only if still current.
    ///
    /// `f` must not block; it exists so an engine can hand a source to its
    /// output element without racing a concurrent stop.
    pub fn run_if_current<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let guard = self.lock_current()?;
        let result = f();
        drop(guard);
        Some(result)
    }

    /// Hand `resource` to the resource manager on behalf of this session.
    ///
    /// A stale session's resource is released on the spot and `None` is
    /// returned: nothing may act on it.
    pub fn track(&self, resource: Box<dyn AudioResource>) -> Option<ResourceId> {
        let _guard = self.shared.lock();
        let mut resources = self.shared.resources();
        let id = resources.track(resource, self.generation);
        if self.is_current() {
            return Some(id);
        }
        resources.release(id);
        tracing::debug!(generation = %self.generation, "Released resource of superseded session");
        None
    }

    /// Audio output has started (`Requesting` to `Playing`).
    pub fn playing(&self) {
        let Some(mut guard) = self.lock_current() else {
            return;
        };
        if guard
            .session()
            .is_some_and(|s| s.status == PlaybackStatus::Requesting)
        {
            guard.transition(PlaybackStatus::Playing);
        }
    }

    /// A new sentence started; drives highlighting.
    pub fn sentence_started(&self, index: usize) {
        let Some(guard) = self.lock_current() else {
            return;
        };
        self.shared.snapshot.send_modify(|snapshot| {
            snapshot.current_sentence_index = Some(index);
        });
        guard.emit(PlaybackEvent::SentenceChanged {
            generation: self.generation,
            index,
        });
    }

    /// Read progress advanced. Forwarded to the progress sink when the
    /// session belongs to a document.
    pub fn progress(&self, progress: ReadingProgress) {
        let Some(guard) = self.lock_current() else {
            return;
        };
        self.shared.snapshot.send_modify(|snapshot| {
            snapshot.progress = Some(progress);
        });
        if let Some(document) = guard.state.document.clone() {
            let _ = self.shared.progress_tx.send((document, progress));
        }
        guard.emit(PlaybackEvent::Progress {
            generation: self.generation,
            progress,
        });
    }

    /// The session reached its natural end.
    pub fn completed(&self) {
        let Some(mut guard) = self.lock_current() else {
            return;
        };
        if !guard.session().is_some_and(|s| s.status.is_active()) {
            return;
        }
        guard.transition(PlaybackStatus::Completed);
        guard.release_all_for(self.generation);
        tracing::info!(generation = %self.generation, "Playback completed");
    }

    /// The session failed: `Errored`, then back to `Idle`.
    pub fn failed(&self, error: PlaybackError) {
        let Some(mut guard) = self.lock_current() else {
            return;
        };
        if !guard.session().is_some_and(|s| s.status.is_active()) {
            return;
        }
        tracing::warn!(generation = %self.generation, %error, "Playback failed");

        let failure = error.to_failure();
        self.shared.snapshot.send_modify(|snapshot| {
            snapshot.last_error = Some(failure.clone());
        });
        guard.emit(PlaybackEvent::Failed {
            generation: self.generation,
            error: failure,
        });
        guard.transition(PlaybackStatus::Errored);
        guard.release_all_for(self.generation);
        guard.publish_status(self.generation, PlaybackStatus::Idle);
    }

    fn lock_current(&self) -> Option<StateGuard<'_>> {
        let guard = self.shared.lock();
        if self.is_current() {
            Some(guard)
        } else {
            tracing::debug!(generation = %self.generation, "Dropped callback of superseded session");
            None
        }
    }
}
