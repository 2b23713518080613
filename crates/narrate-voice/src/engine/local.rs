//! Local engine: speaks text sentence by sentence on the device.
//!
//! A small scheduler task walks the sentence queue strictly in order,
//! awaiting each utterance before starting the next. Pause and stop cancel
//! the current utterance immediately through the primitive; resume speaks
//! the interrupted sentence again from its start.

use std::sync::{Arc, Mutex, PoisonError};

use narrate_core::{EngineKind, Generation, ReadingProgress};
use tokio::sync::watch;

use super::{EngineRequest, SpeechEngine};
use crate::backend::{UtteranceOutcome, UtterancePrimitive};
use crate::error::PlaybackError;
use crate::orchestrator::SessionReporter;
use crate::text_utils;

/// Scheduler control, driven by `pause`/`resume`/`stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Running,
    Paused,
    Stopped,
}

struct ActiveSession {
    generation: Generation,
    control: watch::Sender<Control>,
}

/// Ordered sentences of one session plus the read position.
#[derive(Debug)]
struct SentenceQueue {
    sentences: Vec<String>,
    /// `offsets[i]`: characters spoken once sentence `i` is done.
    offsets: Vec<usize>,
    index: usize,
}

impl SentenceQueue {
    fn new(text: &str) -> Self {
        let sentences = text_utils::segment_sentences(text);
        let offsets = text_utils::cumulative_offsets(&sentences);
        Self {
            sentences,
            offsets,
            index: 0,
        }
    }

    fn current(&self) -> Option<&str> {
        self.sentences.get(self.index).map(String::as_str)
    }

    /// Mark the current sentence spoken and report where that leaves us.
    fn advance(&mut self) -> ReadingProgress {
        let offset = self.offsets.get(self.index).copied().unwrap_or_default();
        self.index += 1;
        ReadingProgress::after_segments(self.index, self.sentences.len(), offset)
    }
}

/// On-device sentence-by-sentence synthesis.
pub struct LocalSynthesisEngine {
    primitive: Arc<dyn UtterancePrimitive>,
    /// Cleared by the scheduler task when its session ends.
    active: Arc<Mutex<Option<ActiveSession>>>,
}

impl LocalSynthesisEngine {
    pub fn new(primitive: Arc<dyn UtterancePrimitive>) -> Self {
        Self {
            primitive,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Generation of the session the scheduler is running, if any.
    pub fn active_generation(&self) -> Option<Generation> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.generation)
    }

    /// Set the control of `generation` if it is the active session.
    /// Returns `true` when the session was found.
    fn set_control(&self, generation: Generation, control: Control) -> bool {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        match active.as_ref() {
            Some(session) if session.generation == generation => {
                session.control.send_replace(control);
                true
            }
            _ => false,
        }
    }
}

impl SpeechEngine for LocalSynthesisEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Local
    }

    fn start(&self, request: EngineRequest, reporter: SessionReporter) -> Result<(), PlaybackError> {
        let queue = SentenceQueue::new(&request.text);
        if queue.sentences.is_empty() {
            return Err(PlaybackError::EmptyText);
        }

        let (control, control_rx) = watch::channel(Control::Running);
        let generation = reporter.generation();
        {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            let newer_running = active.as_ref().is_some_and(|s| s.generation > generation);
            if newer_running || !reporter.is_current() {
                tracing::debug!(%generation, "Ignored start of superseded session");
                return Ok(());
            }
            if let Some(previous) = active.replace(ActiveSession {
                generation,
                control,
            }) {
                previous.control.send_replace(Control::Stopped);
            }
        }

        tracing::debug!(%generation, sentences = queue.sentences.len(), "Local playback scheduled");
        let primitive = Arc::clone(&self.primitive);
        let active = Arc::clone(&self.active);
        tokio::spawn(async move {
            run_queue(queue, primitive, control_rx, reporter).await;
            active
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take_if(|s| s.generation == generation);
        });
        Ok(())
    }

    fn pause(&self, generation: Generation) {
        if self.set_control(generation, Control::Paused) {
            self.primitive.cancel();
        }
    }

    fn resume(&self, generation: Generation) {
        self.set_control(generation, Control::Running);
    }

    fn stop(&self, generation: Generation) {
        let stopped = {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            active.take_if(|s| s.generation == generation)
        };
        if let Some(session) = stopped {
            session.control.send_replace(Control::Stopped);
            self.primitive.cancel();
        }
    }
}

/// The scheduler: one utterance at a time until the queue is exhausted or
/// the session is stopped.
async fn run_queue(
    mut queue: SentenceQueue,
    primitive: Arc<dyn UtterancePrimitive>,
    mut control: watch::Receiver<Control>,
    reporter: SessionReporter,
) {
    let generation = reporter.generation();
    let mut announced = None;

    while let Some(sentence) = queue.current() {
        if !wait_until_running(&mut control).await || !reporter.is_current() {
            tracing::debug!(%generation, "Local playback stopped between utterances");
            return;
        }

        if announced != Some(queue.index) {
            reporter.sentence_started(queue.index);
            announced = Some(queue.index);
        }

        let outcome = tokio::select! {
            biased;
            _ = control.wait_for(|c| *c != Control::Running) => None,
            result = primitive.speak(sentence) => Some(result),
        };

        match outcome {
            // Interrupted by pause or stop; the loop head decides which.
            None | Some(Ok(UtteranceOutcome::Cancelled)) => {}
            Some(Ok(UtteranceOutcome::Finished)) => {
                let progress = queue.advance();
                reporter.progress(progress);
            }
            Some(Err(e)) => {
                reporter.failed(e);
                return;
            }
        }
    }

    reporter.completed();
}

/// Park while paused. Returns `false` once stopped.
async fn wait_until_running(control: &mut watch::Receiver<Control>) -> bool {
    match control.wait_for(|c| *c != Control::Paused).await {
        Ok(c) => *c == Control::Running,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_reports_half_then_full() {
        let mut queue = SentenceQueue::new("Hello. World.");
        assert_eq!(queue.current(), Some("Hello."));

        let first = queue.advance();
        assert_eq!(first.percent_complete, 50);
        assert_eq!(first.last_char_offset, 6);

        assert_eq!(queue.current(), Some("World."));
        let second = queue.advance();
        assert_eq!(second.percent_complete, 100);
        assert_eq!(second.last_char_offset, 12);
        assert_eq!(queue.current(), None);
    }

    #[test]
    fn queue_progress_is_monotone() {
        let mut queue = SentenceQueue::new("One. Two. Three. Four. Five. Six. Seven.");
        let mut last = 0;
        while queue.current().is_some() {
            let progress = queue.advance();
            assert!(progress.percent_complete >= last);
            last = progress.percent_complete;
        }
        assert_eq!(last, 100);
    }
}
