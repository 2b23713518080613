//! Dedicated audio thread that keeps `!Send` output handles off the async runtime.
//!
//! `rodio::OutputStream` is `!Send` on some platforms (macOS CoreAudio, etc.).
//! Instead of `unsafe impl Send`, the stream is confined to one OS thread and
//! every operation is routed through an [`AudioCommand`].
//!
//! [`RodioAudioElement`] is the `Send + Sync` proxy the remote engine holds.

use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::backend::{AudioElement, EndedCallback};
use crate::error::PlaybackError;
use crate::playback::AudioPlayback;
use crate::resources::AudioBlob;

// ── Commands ───────────────────────────────────────────────────────

enum AudioCommand {
    /// Assign a new source, silently stopping the old one.
    SetSource {
        blob: AudioBlob,
        on_ended: EndedCallback,
    },

    /// Decode and start the assigned source.
    Play {
        reply: oneshot::Sender<Result<(), PlaybackError>>,
    },

    Pause,

    Resume,

    /// Stop output and drop the source (fire-and-forget).
    Stop,

    Shutdown,
}

// ── Handle (Send + Sync proxy) ─────────────────────────────────────

/// Reusable audio element backed by the default output device.
pub struct RodioAudioElement {
    cmd_tx: mpsc::Sender<AudioCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RodioAudioElement {
    /// Spawn the audio thread and open the output device on it.
    ///
    /// Device errors are sent back over a one-shot init channel.
    pub fn spawn() -> Result<Self, PlaybackError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<AudioCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), PlaybackError>>();

        let thread = thread::Builder::new()
            .name("narrate-audio".into())
            .spawn(move || Self::run(&cmd_rx, &init_tx))
            .map_err(|e| {
                PlaybackError::PlaybackBlocked(format!("failed to spawn audio thread: {e}"))
            })?;

        init_rx
            .recv()
            .map_err(|_| audio_thread_died())??;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    fn send(&self, cmd: AudioCommand) -> Result<(), PlaybackError> {
        self.cmd_tx.send(cmd).map_err(|_| audio_thread_died())
    }

    // ── Audio thread event loop ────────────────────────────────────

    fn run(cmd_rx: &mpsc::Receiver<AudioCommand>, init_tx: &mpsc::Sender<Result<(), PlaybackError>>) {
        let mut playback = match AudioPlayback::new() {
            Ok(p) => p,
            Err(e) => {
                let _ = init_tx.send(Err(e));
                return;
            }
        };

        if init_tx.send(Ok(())).is_err() {
            return;
        }

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                AudioCommand::SetSource { blob, on_ended } => playback.set_source(blob, on_ended),
                AudioCommand::Play { reply } => {
                    let _ = reply.send(playback.play());
                }
                AudioCommand::Pause => playback.pause(),
                AudioCommand::Resume => playback.resume(),
                AudioCommand::Stop => playback.stop(),
                AudioCommand::Shutdown => break,
            }
        }

        playback.stop();
        tracing::debug!("Audio thread shutting down");
    }
}

#[async_trait]
impl AudioElement for RodioAudioElement {
    fn set_source(&self, source: AudioBlob, on_ended: EndedCallback) -> Result<(), PlaybackError> {
        self.send(AudioCommand::SetSource {
            blob: source,
            on_ended,
        })
    }

    async fn play(&self) -> Result<(), PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.send(AudioCommand::Play { reply })?;
        rx.await.map_err(|_| audio_thread_died())?
    }

    fn pause(&self) {
        let _ = self.send(AudioCommand::Pause);
    }

    fn resume(&self) {
        let _ = self.send(AudioCommand::Resume);
    }

    fn stop(&self) {
        let _ = self.send(AudioCommand::Stop);
    }
}

impl Drop for RodioAudioElement {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

fn audio_thread_died() -> PlaybackError {
    PlaybackError::PlaybackBlocked("audio thread is not running".to_string())
}
