//! Playback resource tracking.
//!
//! Every externally acquired playback resource (an encoded audio blob handed
//! to the output element) is tracked against the generation that created
//! it and released exactly once: on natural end, error, explicit stop or
//! supersession, whichever comes first.
//!
//! Release consumes the resource (`Box<Self>`), so a second release of the
//! same resource is impossible by construction; releasing an id that is no
//! longer tracked is a no-op.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use narrate_core::Generation;

/// An acquired handle to playable audio that must be given back.
pub trait AudioResource: Send + fmt::Debug {
    /// Give the resource back. Called exactly once.
    fn release(self: Box<Self>);
}

/// Handle to a tracked resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "res-{}", self.0)
    }
}

/// Lifetime counters, used to check the exactly-once invariant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceStats {
    /// Resources ever tracked.
    pub tracked_total: u64,
    /// Resources ever released.
    pub released_total: u64,
}

impl ResourceStats {
    /// Resources tracked but not yet released.
    pub const fn outstanding(&self) -> u64 {
        self.tracked_total - self.released_total
    }
}

#[derive(Debug)]
struct Tracked {
    generation: Generation,
    resource: Box<dyn AudioResource>,
}

/// Owns playback resources on behalf of their generations.
#[derive(Debug, Default)]
pub struct ResourceManager {
    next_id: u64,
    tracked: HashMap<ResourceId, Tracked>,
    stats: ResourceStats,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `resource` on behalf of `generation`.
    pub fn track(&mut self, resource: Box<dyn AudioResource>, generation: Generation) -> ResourceId {
        self.next_id += 1;
        let id = ResourceId(self.next_id);
        tracing::debug!(%id, %generation, ?resource, "Tracking playback resource");
        self.tracked.insert(
            id,
            Tracked {
                generation,
                resource,
            },
        );
        self.stats.tracked_total += 1;
        id
    }

    /// Release one resource. Returns `false` if it was already released.
    pub fn release(&mut self, id: ResourceId) -> bool {
        let Some(tracked) = self.tracked.remove(&id) else {
            return false;
        };
        tracing::debug!(%id, generation = %tracked.generation, "Releasing playback resource");
        tracked.resource.release();
        self.stats.released_total += 1;
        true
    }

    /// Release everything owned by `generation`. Returns how many were released.
    pub fn release_all_for(&mut self, generation: Generation) -> usize {
        let ids: Vec<ResourceId> = self
            .tracked
            .iter()
            .filter(|(_, tracked)| tracked.generation == generation)
            .map(|(id, _)| *id)
            .collect();
        ids.into_iter().filter(|id| self.release(*id)).count()
    }

    /// Release every tracked resource regardless of owner.
    pub fn release_all(&mut self) -> usize {
        let ids: Vec<ResourceId> = self.tracked.keys().copied().collect();
        ids.into_iter().filter(|id| self.release(*id)).count()
    }

    pub fn is_tracked(&self, id: ResourceId) -> bool {
        self.tracked.contains_key(&id)
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    pub fn tracked_for(&self, generation: Generation) -> usize {
        self.tracked
            .values()
            .filter(|tracked| tracked.generation == generation)
            .count()
    }

    pub const fn stats(&self) -> ResourceStats {
        self.stats
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        let released = self.release_all();
        if released > 0 {
            tracing::debug!(released, "Released leftover playback resources on shutdown");
        }
    }
}

/// Encoded audio returned by the remote service, ready for the output element.
///
/// Cloning the payload is cheap (`Bytes` is reference counted), so the
/// output element can hold a view while the manager owns the blob.
#[derive(Clone)]
pub struct AudioBlob {
    bytes: Bytes,
    content_type: String,
}

impl AudioBlob {
    pub fn new(bytes: Bytes, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for AudioBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioBlob")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl AudioResource for AudioBlob {
    fn release(self: Box<Self>) {
        tracing::trace!(len = self.bytes.len(), "Audio blob released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct CountingResource {
        releases: Arc<AtomicUsize>,
    }

    impl AudioResource for CountingResource {
        fn release(self: Box<Self>) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting(releases: &Arc<AtomicUsize>) -> Box<dyn AudioResource> {
        Box::new(CountingResource {
            releases: Arc::clone(releases),
        })
    }

    #[test]
    fn release_is_idempotent() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut manager = ResourceManager::new();
        let id = manager.track(counting(&releases), Generation::new(1));

        assert!(manager.release(id));
        assert!(!manager.release(id));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert!(!manager.is_tracked(id));
    }

    #[test]
    fn release_all_for_only_touches_that_generation() {
        let old = Arc::new(AtomicUsize::new(0));
        let new = Arc::new(AtomicUsize::new(0));
        let mut manager = ResourceManager::new();
        manager.track(counting(&old), Generation::new(1));
        manager.track(counting(&old), Generation::new(1));
        manager.track(counting(&new), Generation::new(2));

        assert_eq!(manager.release_all_for(Generation::new(1)), 2);
        assert_eq!(old.load(Ordering::SeqCst), 2);
        assert_eq!(new.load(Ordering::SeqCst), 0);
        assert_eq!(manager.tracked_for(Generation::new(2)), 1);

        assert_eq!(manager.release_all_for(Generation::new(1)), 0);
    }

    #[test]
    fn stats_balance_after_release() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut manager = ResourceManager::new();
        manager.track(counting(&releases), Generation::new(1));
        manager.track(counting(&releases), Generation::new(2));
        assert_eq!(manager.stats().outstanding(), 2);

        manager.release_all();
        let stats = manager.stats();
        assert_eq!(stats.tracked_total, 2);
        assert_eq!(stats.released_total, 2);
        assert_eq!(stats.outstanding(), 0);
    }

    #[test]
    fn drop_releases_leftovers_once() {
        let releases = Arc::new(AtomicUsize::new(0));
        {
            let mut manager = ResourceManager::new();
            let id = manager.track(counting(&releases), Generation::new(1));
            manager.track(counting(&releases), Generation::new(1));
            manager.release(id);
        }
        assert_eq!(releases.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn blob_debug_hides_payload() {
        let blob = AudioBlob::new(Bytes::from_static(b"ID3abc"), "audio/mpeg");
        let debug = format!("{blob:?}");
        assert!(debug.contains("audio/mpeg"));
        assert!(debug.contains("len: 6"));
        assert!(!blob.is_empty());
    }
}
