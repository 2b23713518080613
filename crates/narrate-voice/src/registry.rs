//! Session registry, the single arbiter of which playback is authoritative.
//!
//! Every async callback from either engine carries the generation it was
//! started under and must pass [`SessionRegistry::is_current`] before it
//! touches observable state. A slow remote fetch resolving after the user
//! already started another playback is dropped here.

use std::sync::atomic::{AtomicU64, Ordering};

use narrate_core::Generation;

/// Low bit of the packed state: set once the latest generation is revoked.
const INVALIDATED: u64 = 1;

/// Issues strictly increasing generations.
///
/// State is packed into one atomic word, `latest << 1 | invalidated`, so
/// `begin` and `invalidate_all` are each a single atomic step.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    state: AtomicU64,
}

impl SessionRegistry {
    pub const fn new() -> Self {
        Self {
            state: AtomicU64::new(0),
        }
    }

    /// Issue a new generation, invalidating every earlier one.
    pub fn begin(&self) -> Generation {
        let previous = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                Some(((state >> 1) + 1) << 1)
            })
            .unwrap_or_else(|state| state);
        Generation::new((previous >> 1) + 1)
    }

    /// `true` iff `generation` is the latest issued and not invalidated.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.state.load(Ordering::Acquire) == generation.get() << 1
    }

    /// Revoke the latest generation without issuing a replacement.
    pub fn invalidate_all(&self) {
        self.state.fetch_or(INVALIDATED, Ordering::AcqRel);
    }

    /// The authoritative generation, if one exists.
    pub fn current(&self) -> Option<Generation> {
        let state = self.state.load(Ordering::Acquire);
        let latest = state >> 1;
        (latest > 0 && state & INVALIDATED == 0).then(|| Generation::new(latest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_registry_has_no_current_generation() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.current(), None);
        assert!(!registry.is_current(Generation::new(0)));
    }

    #[test]
    fn begin_issues_strictly_increasing_generations() {
        let registry = SessionRegistry::new();
        let a = registry.begin();
        let b = registry.begin();
        let c = registry.begin();
        assert!(a < b && b < c);
        assert_eq!(a, Generation::new(1));
    }

    #[test]
    fn only_latest_generation_is_current() {
        let registry = SessionRegistry::new();
        let first = registry.begin();
        assert!(registry.is_current(first));

        let second = registry.begin();
        assert!(!registry.is_current(first));
        assert!(registry.is_current(second));
        assert_eq!(registry.current(), Some(second));
    }

    #[test]
    fn invalidate_all_revokes_without_replacement() {
        let registry = SessionRegistry::new();
        let generation = registry.begin();
        registry.invalidate_all();

        assert!(!registry.is_current(generation));
        assert_eq!(registry.current(), None);
    }

    #[test]
    fn begin_after_invalidate_moves_past_revoked_generation() {
        let registry = SessionRegistry::new();
        let revoked = registry.begin();
        registry.invalidate_all();
        registry.invalidate_all();

        let next = registry.begin();
        assert!(next > revoked);
        assert!(registry.is_current(next));
        assert!(!registry.is_current(revoked));
    }

    #[test]
    fn concurrent_begins_never_repeat() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let registry = Arc::new(SessionRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || (0..250).map(|_| registry.begin()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for generation in handle.join().unwrap() {
                assert!(seen.insert(generation), "duplicate {generation}");
            }
        }
        assert_eq!(seen.len(), 1000);
    }
}
