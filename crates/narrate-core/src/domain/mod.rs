//! Domain types for speech playback sessions.

mod progress;
mod session;

pub use progress::{DocumentId, ReadingProgress};
pub use session::{EngineKind, Generation, PlaybackSession, PlaybackStatus};
