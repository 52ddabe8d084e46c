//! HTTP server setup and graceful serving.
//!
//! # Responsibilities
//! - Compose the facade-built router from the status routes
//! - Serve on a prepared listener with graceful shutdown
//! - Bound per-request resource hold time via the request timeout

use std::sync::Arc;
use std::time::Duration;

use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::ServiceConfig;
use crate::http::{routes, AppState, HttpFacade};
use crate::observer::Observe;
use crate::status::StatusStore;

/// The status service HTTP server.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Build the server from explicitly constructed collaborators; no
    /// ambient state, so isolated instances can run in parallel tests.
    pub fn new(config: &ServiceConfig, store: Arc<StatusStore>, observer: Arc<dyn Observe>) -> Self {
        let state = AppState { store, observer };

        // Method mismatches are handled in-handler so they produce the
        // logged 405 path, hence `any()` registrations.
        let router = HttpFacade::new()
            .register("/status", any(routes::status))
            .register("/status/{code}", any(routes::set_status))
            .register("/flaky", any(routes::flaky))
            .build(
                state,
                Duration::from_secs(config.server.request_timeout_secs),
            );

        Self { router }
    }

    /// Serve until the shutdown signal fires, then drain in-flight
    /// requests before returning.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "status server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("status server stopped");
        Ok(())
    }
}
