//! The closed set of legal HTTP status codes and its random-selection policy.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Every status code this service will ever report or accept.
///
/// Closed and ordered; never extended at runtime.
pub const LEGAL_CODES: [u16; 61] = [
    100, 101, 102, 103, // 1xx
    200, 201, 202, 203, 204, 205, 206, 207, 208, 226, // 2xx
    300, 301, 302, 303, 304, 305, 307, 308, // 3xx
    400, 401, 402, 403, 404, 405, 406, 407, 408, 409, // 40x
    410, 411, 412, 413, 414, 415, 416, 417, 418, // 41x
    421, 422, 423, 424, 426, 428, 429, // 42x
    431, 451, // remaining 4xx
    500, 501, 502, 503, 504, 505, 506, 507, 508, 510, 511, // 5xx
];

/// Upper bound (exclusive) for the flaky-read delay.
pub const MAX_FLAKY_DELAY: Duration = Duration::from_millis(500);

/// Membership checks and uniform random draws over [`LEGAL_CODES`].
///
/// The RNG is behind a mutex so the registry can be shared across
/// request-handling tasks; the lock is held only for the draw itself.
pub struct StatusCodeRegistry {
    rng: Mutex<StdRng>,
}

impl StatusCodeRegistry {
    /// Create a registry seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a registry with a fixed seed for deterministic tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Whether `code` belongs to the legal set.
    pub fn contains(&self, code: u16) -> bool {
        LEGAL_CODES.contains(&code)
    }

    /// Uniformly random member of the legal set.
    pub fn random_code(&self) -> u16 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        LEGAL_CODES[rng.gen_range(0..LEGAL_CODES.len())]
    }

    /// Uniformly random delay in `[0, MAX_FLAKY_DELAY)`.
    pub fn random_delay(&self) -> Duration {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Duration::from_millis(rng.gen_range(0..MAX_FLAKY_DELAY.as_millis() as u64))
    }
}

impl Default for StatusCodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_set_has_expected_members() {
        assert_eq!(LEGAL_CODES.len(), 61);
        let registry = StatusCodeRegistry::new();
        assert!(registry.contains(200));
        assert!(registry.contains(418));
        assert!(registry.contains(511));
        assert!(!registry.contains(306));
        assert!(!registry.contains(999));
        assert!(!registry.contains(0));
    }

    #[test]
    fn random_code_is_always_legal() {
        let registry = StatusCodeRegistry::new();
        for _ in 0..1000 {
            assert!(registry.contains(registry.random_code()));
        }
    }

    #[test]
    fn seeded_registries_draw_identical_sequences() {
        let a = StatusCodeRegistry::with_seed(7);
        let b = StatusCodeRegistry::with_seed(7);
        let draws_a: Vec<u16> = (0..32).map(|_| a.random_code()).collect();
        let draws_b: Vec<u16> = (0..32).map(|_| b.random_code()).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn random_delay_stays_below_bound() {
        let registry = StatusCodeRegistry::new();
        for _ in 0..1000 {
            assert!(registry.random_delay() < MAX_FLAKY_DELAY);
        }
    }
}
