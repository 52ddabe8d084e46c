//! Mutable status state and the legal status code set.
//!
//! # Data Flow
//! ```text
//! HTTP handlers:
//!     GET /status         → StatusStore::read()
//!     POST /status/{code} → StatusStore::set()
//!     POST /flaky         → StatusStore::toggle_flaky()
//!
//! StatusStore consults StatusCodeRegistry for validation and
//! random draws (flaky mode).
//! ```
//!
//! # Design Decisions
//! - Store fields are individually atomic; no joint snapshot is needed
//! - Flaky reads never hold a lock while sleeping
//! - The registry owns a seedable RNG so tests get deterministic draws

pub mod registry;
pub mod store;

pub use registry::StatusCodeRegistry;
pub use store::StatusStore;

use thiserror::Error;

/// Errors produced by status state mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    /// The candidate is not a member of the legal status code set.
    #[error("invalid http status code: {0}")]
    InvalidCode(u16),
}
