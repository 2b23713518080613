//! Progress persistence port.
//!
//! The orchestrator hands every progress update for a document to a sink and
//! never reads it back during an active session.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{DocumentId, ReadingProgress};

/// Errors a sink may report. The orchestrator logs them and carries on.
#[derive(Debug, Error)]
pub enum ProgressSinkError {
    /// The backing store rejected or lost the write.
    #[error("Progress store unavailable: {0}")]
    Unavailable(String),

    /// The document is unknown to the store.
    #[error("Unknown document: {0}")]
    UnknownDocument(DocumentId),
}

/// Accepts reading progress for a document.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Persist the latest progress for `document`.
    async fn save_progress(
        &self,
        document: &DocumentId,
        progress: ReadingProgress,
    ) -> Result<(), ProgressSinkError>;
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgressSink;

#[async_trait]
impl ProgressSink for NoopProgressSink {
    async fn save_progress(
        &self,
        _document: &DocumentId,
        _progress: ReadingProgress,
    ) -> Result<(), ProgressSinkError> {
        Ok(())
    }
}

/// A sink that only records progress in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingProgressSink;

#[async_trait]
impl ProgressSink for LoggingProgressSink {
    async fn save_progress(
        &self,
        document: &DocumentId,
        progress: ReadingProgress,
    ) -> Result<(), ProgressSinkError> {
        tracing::info!(
            %document,
            percent = progress.percent_complete,
            offset = progress.last_char_offset,
            "Reading progress"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn noop_sink_accepts_everything() {
        let sink = NoopProgressSink;
        let result = sink
            .save_progress(&DocumentId::new("doc-1"), ReadingProgress::complete(10))
            .await;
        tokio_test::assert_ok!(result);
    }

    #[tokio::test]
    async fn mock_sink_receives_document_and_progress() {
        let mut sink = MockProgressSink::new();
        sink.expect_save_progress()
            .withf(|doc, progress| doc.as_str() == "draft-7" && progress.percent_complete == 50)
            .times(1)
            .returning(|_, _| Ok(()));

        let sink: Arc<dyn ProgressSink> = Arc::new(sink);
        sink.save_progress(
            &DocumentId::new("draft-7"),
            ReadingProgress::after_segments(1, 2, 6),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn mock_sink_can_fail() {
        let mut sink = MockProgressSink::new();
        sink.expect_save_progress()
            .returning(|doc, _| Err(ProgressSinkError::UnknownDocument(doc.clone())));

        let err = sink
            .save_progress(&DocumentId::new("gone"), ReadingProgress::complete(0))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("gone"));
    }
}
