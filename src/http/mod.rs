//! HTTP surface of the status service.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → HttpFacade (route tag, span, metrics, timeout)
//!     → status routes (read / set / toggle state)
//!     → response written, outcome logged by severity band
//! ```

pub mod facade;
pub mod routes;
pub mod server;

pub use facade::HttpFacade;
pub use server::HttpServer;

use std::sync::Arc;

use crate::observer::Observe;
use crate::status::StatusStore;

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<StatusStore>,
    pub observer: Arc<dyn Observe>,
}
