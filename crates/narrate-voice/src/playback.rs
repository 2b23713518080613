//! Audio output via `rodio`.
//!
//! Decodes an encoded audio blob (MP3, WAV, Ogg Vorbis) and plays it on the
//! default output device. Lives on the audio thread; see
//! [`crate::audio_thread`] for the `Send + Sync` proxy.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use crate::backend::EndedCallback;
use crate::error::PlaybackError;
use crate::resources::AudioBlob;

/// A source waiting for `play()`.
struct PendingSource {
    blob: AudioBlob,
    on_ended: EndedCallback,
}

/// Output-device side of the audio element.
pub struct AudioPlayback {
    /// rodio output stream (must be kept alive).
    _stream: OutputStream,

    /// Handle used to create sinks.
    stream_handle: OutputStreamHandle,

    /// Source assigned but not yet started.
    pending: Option<PendingSource>,

    /// Sink of the source currently playing (if any).
    sink: Option<Arc<Sink>>,

    /// Cleared by `stop()` so the completion watcher stays silent.
    active: Arc<AtomicBool>,
}

impl AudioPlayback {
    /// Open the default output device.
    pub fn new() -> Result<Self, PlaybackError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| PlaybackError::PlaybackBlocked(e.to_string()))?;

        tracing::info!("Audio playback initialized on default output device");

        Ok(Self {
            _stream: stream,
            stream_handle,
            pending: None,
            sink: None,
            active: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Replace the current source. Whatever was playing stops silently.
    pub fn set_source(&mut self, blob: AudioBlob, on_ended: EndedCallback) {
        self.stop();
        tracing::debug!(?blob, "Audio source assigned");
        self.pending = Some(PendingSource { blob, on_ended });
    }

    /// Decode the pending source and start output.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        let Some(PendingSource { blob, on_ended }) = self.pending.take() else {
            return Err(PlaybackError::Synthesis("no audio source assigned".to_string()));
        };

        let decoder = Decoder::new(Cursor::new(blob.bytes().clone()))
            .map_err(|e| PlaybackError::Synthesis(format!("failed to decode audio: {e}")))?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| PlaybackError::PlaybackBlocked(e.to_string()))?;
        sink.append(decoder);

        let sink = Arc::new(sink);
        let active = Arc::new(AtomicBool::new(true));
        self.sink = Some(Arc::clone(&sink));
        self.active = Arc::clone(&active);

        // `sleep_until_end()` returns when the queue drains or the sink is
        // stopped; `active` tells the two apart.
        std::thread::spawn(move || {
            sink.sleep_until_end();
            if active.swap(false, Ordering::SeqCst) {
                tracing::debug!("Playback finished naturally");
                on_ended(Ok(()));
            }
        });

        tracing::debug!(len = blob.len(), "Audio playback started");
        Ok(())
    }

    pub fn pause(&self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    pub fn resume(&self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    /// Stop output immediately and drop the source without a callback.
    pub fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        self.pending = None;
        if let Some(sink) = self.sink.take() {
            sink.stop();
            tracing::debug!("Audio playback stopped");
        }
    }
}
