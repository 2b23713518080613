//! Read-progress reporting.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies the document whose read progress is being tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How far through a text playback has got.
///
/// Produced by the engines and pushed to the progress sink; the
/// orchestrator only keeps the latest value for its snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    /// 0..=100.
    pub percent_complete: u8,
    /// Characters of text spoken so far.
    pub last_char_offset: usize,
    pub updated_at: DateTime<Utc>,
}

impl ReadingProgress {
    /// Progress after `completed` of `total` segments have been spoken.
    ///
    /// `total == 0` is treated as finished.
    pub fn after_segments(completed: usize, total: usize, last_char_offset: usize) -> Self {
        let percent = if total == 0 || completed >= total {
            100
        } else {
            // completed < total, so the quotient is always below 100.
            u8::try_from(completed * 100 / total).unwrap_or(100)
        };
        Self {
            percent_complete: percent,
            last_char_offset,
            updated_at: Utc::now(),
        }
    }

    /// Progress for a fully spoken text.
    pub fn complete(last_char_offset: usize) -> Self {
        Self {
            percent_complete: 100,
            last_char_offset,
            updated_at: Utc::now(),
        }
    }

    pub const fn is_complete(&self) -> bool {
        self.percent_complete >= 100
    }
}
