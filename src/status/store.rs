//! The stateful core of the status toggle protocol.

use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::time::Duration;

use crate::status::registry::StatusCodeRegistry;
use crate::status::StatusError;

/// Code a fresh store reports until told otherwise.
pub const DEFAULT_CODE: u16 = 200;

/// Holds the current fixed status code and the flaky flag.
///
/// Constructed once at startup and shared across request handlers.
/// Each field is individually atomic; readers racing a write observe
/// either the old or the new value, never a torn one.
pub struct StatusStore {
    current: AtomicU16,
    flaky: AtomicBool,
    registry: StatusCodeRegistry,
}

impl StatusStore {
    pub fn new(registry: StatusCodeRegistry) -> Self {
        Self {
            current: AtomicU16::new(DEFAULT_CODE),
            flaky: AtomicBool::new(false),
            registry,
        }
    }

    /// Current status code plus the delay observed producing it.
    ///
    /// Non-flaky reads return the stored code immediately. Flaky reads
    /// sample a random legal code, sleep a random `[0, 500ms)` interval
    /// to simulate backend degradation, store the sampled code so later
    /// non-flaky reads reflect the last draw, and return it. The sleep
    /// holds no lock; concurrent requests proceed unaffected.
    pub async fn read(&self) -> (u16, Duration) {
        if !self.flaky.load(Ordering::Relaxed) {
            return (self.current.load(Ordering::Relaxed), Duration::ZERO);
        }

        let code = self.registry.random_code();
        let delay = self.registry.random_delay();
        tokio::time::sleep(delay).await;
        self.current.store(code, Ordering::Relaxed);
        (code, delay)
    }

    /// Overwrite the stored code.
    ///
    /// Invalid candidates are rejected before any mutation. Returns
    /// whether the stored value actually changed. Does not clear flaky
    /// mode; while flaky is set it takes precedence over the fixed code.
    pub fn set(&self, candidate: u16) -> Result<bool, StatusError> {
        if !self.registry.contains(candidate) {
            return Err(StatusError::InvalidCode(candidate));
        }
        let previous = self.current.swap(candidate, Ordering::Relaxed);
        Ok(previous != candidate)
    }

    /// Flip the flaky flag, returning the new state.
    ///
    /// Takes effect for subsequent reads; in-flight reads are unaffected.
    pub fn toggle_flaky(&self) -> bool {
        !self.flaky.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn is_flaky(&self) -> bool {
        self.flaky.load(Ordering::Relaxed)
    }

    pub fn current(&self) -> u16 {
        self.current.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::registry::LEGAL_CODES;

    fn store() -> StatusStore {
        StatusStore::new(StatusCodeRegistry::with_seed(42))
    }

    #[tokio::test]
    async fn set_then_read_returns_the_code_for_every_legal_code() {
        let store = store();
        for &code in &LEGAL_CODES {
            store.set(code).unwrap();
            assert_eq!(store.read().await, (code, Duration::ZERO));
        }
    }

    #[test]
    fn set_reports_whether_the_value_changed() {
        let store = store();
        assert!(!store.set(200).unwrap()); // default is already 200
        assert!(store.set(404).unwrap());
        assert!(!store.set(404).unwrap());
    }

    #[test]
    fn invalid_codes_are_rejected_before_mutation() {
        let store = store();
        store.set(404).unwrap();
        for bad in [0, 99, 306, 600, 999, u16::MAX] {
            assert_eq!(store.set(bad), Err(StatusError::InvalidCode(bad)));
            assert_eq!(store.current(), 404);
        }
    }

    #[test]
    fn toggle_flaky_is_its_own_inverse() {
        let store = store();
        assert!(!store.is_flaky());
        assert!(store.toggle_flaky());
        assert!(!store.toggle_flaky());
        assert!(!store.is_flaky());
    }

    #[test]
    fn set_does_not_clear_flaky_mode() {
        let store = store();
        store.toggle_flaky();
        store.set(503).unwrap();
        assert!(store.is_flaky());
    }

    #[tokio::test(start_paused = true)]
    async fn flaky_reads_stay_legal_and_bounded() {
        let store = store();
        store.toggle_flaky();
        let registry = StatusCodeRegistry::new();
        for _ in 0..1000 {
            let (code, delay) = store.read().await;
            assert!(registry.contains(code));
            assert!(delay < Duration::from_millis(500));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn flaky_draw_persists_for_later_fixed_reads() {
        let store = store();
        store.toggle_flaky();
        let (drawn, _) = store.read().await;
        store.toggle_flaky();
        assert_eq!(store.read().await, (drawn, Duration::ZERO));
    }
}
