//! Status service with composed observability.
//!
//! A demonstration service exposing a mutable HTTP status code behind
//! an instrumentation pipeline, used to exercise client resilience
//! against unreliable backends.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌────────────────────────────────────────────────┐
//!                  │                 STATUS SERVICE                  │
//!                  │                                                 │
//!   HTTP request   │  ┌────────────┐     ┌─────────────────────┐    │
//!   ───────────────┼─▶│ HttpFacade │────▶│    status routes     │    │
//!                  │  │ span/metric│     │ GET  /status         │    │
//!                  │  │ route tag  │     │ POST /status/{code}  │    │
//!                  │  └─────┬──────┘     │ POST /flaky          │    │
//!                  │        │            └──────────┬──────────┘    │
//!                  │        ▼                       ▼               │
//!                  │  ┌────────────┐     ┌─────────────────────┐    │
//!                  │  │  Observer  │     │     StatusStore      │    │
//!                  │  │ logs/metric│     │ current code + flaky │    │
//!                  │  │ trace/prop │     │ StatusCodeRegistry   │    │
//!                  │  └────────────┘     └─────────────────────┘    │
//!                  │                                                 │
//!                  │  metrics listener (own bind address, /metrics)  │
//!                  └────────────────────────────────────────────────┘
//! ```
//!
//! The Observer is constructed once via ordered options, each of which
//! may register a shutdown action; `Observer::shutdown` runs them all
//! and aggregates their errors.

// Core subsystems
pub mod config;
pub mod http;
pub mod status;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observer;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observer::{Observe, Observer};
pub use status::{StatusCodeRegistry, StatusStore};
