//! Premium-voice entitlement port.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Read-only view of whether the premium (remote) voice may be used.
///
/// Consulted once per `play()`; a change mid-session has no effect on the
/// running session.
#[cfg_attr(test, mockall::automock)]
pub trait EntitlementPort: Send + Sync {
    fn premium_voice_allowed(&self) -> bool;
}

/// Entitlement backed by a shared flag.
///
/// Clones share the flag, so an auth layer can flip it while the
/// orchestrator holds another clone.
#[derive(Debug, Clone, Default)]
pub struct StaticEntitlement {
    allowed: Arc<AtomicBool>,
}

impl StaticEntitlement {
    pub fn new(allowed: bool) -> Self {
        Self {
            allowed: Arc::new(AtomicBool::new(allowed)),
        }
    }

    pub fn set_allowed(&self, allowed: bool) {
        self.allowed.store(allowed, Ordering::SeqCst);
    }
}

impl EntitlementPort for StaticEntitlement {
    fn premium_voice_allowed(&self) -> bool {
        self.allowed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_entitled() {
        assert!(!StaticEntitlement::default().premium_voice_allowed());
    }

    #[test]
    fn clones_share_the_flag() {
        let a = StaticEntitlement::new(false);
        let b = a.clone();
        a.set_allowed(true);
        assert!(b.premium_voice_allowed());
    }

    #[test]
    fn mock_entitlement() {
        let mut port = MockEntitlementPort::new();
        port.expect_premium_voice_allowed().return_const(true);
        assert!(port.premium_voice_allowed());
    }
}
