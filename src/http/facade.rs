//! Instrumented wrapper around the HTTP multiplexer.
//!
//! # Responsibilities
//! - Register routes so their pattern becomes the route tag
//! - Wrap the routed mux with one instrumentation layer bound to the
//!   Observer: span per request, route-tagged count/latency metrics,
//!   inbound trace context propagated into the handler's context
//!
//! # Design Decisions
//! - The route tag is the registered pattern, not the literal request
//!   path, so `/status/{code}` stays one series regardless of segment
//! - Instrumentation is a route layer: it runs after matching, where
//!   the matched pattern is known; unmatched 404s bypass it

use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::MethodRouter;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::http::AppState;
use crate::observer::{Context, MetricSink, Propagator, Tracer};

/// Collects routes, then wraps the whole mux with instrumentation.
pub struct HttpFacade {
    router: Router<AppState>,
}

impl HttpFacade {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    /// Attach a route; the pattern doubles as its route tag.
    pub fn register(mut self, pattern: &str, handler: MethodRouter<AppState>) -> Self {
        self.router = self.router.route(pattern, handler);
        self
    }

    /// Wrap the registered routes with instrumentation bound to the
    /// Observer and produce the final request handler.
    pub fn build(self, state: AppState, request_timeout: Duration) -> Router {
        self.router
            .route_layer(middleware::from_fn_with_state(state.clone(), instrument))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(request_timeout)),
            )
            .with_state(state)
    }
}

impl Default for HttpFacade {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-request instrumentation: one span covering the request
/// lifetime, route-tagged metrics, inbound trace context continued.
async fn instrument(
    State(state): State<AppState>,
    matched: MatchedPath,
    mut req: Request,
    next: Next,
) -> Response {
    let route = matched.as_str().to_string();
    let method = req.method().to_string();

    let inbound = state.observer.extract(req.headers());
    let span = state
        .observer
        .start_span(&route, inbound.span.as_ref());
    let cx = Context {
        span: Some(span),
        baggage: inbound.baggage,
    };
    req.extensions_mut().insert(cx);

    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed();

    state
        .observer
        .record_request(&route, &method, response.status().as_u16(), elapsed);
    state.observer.end_span(&span, &route, elapsed);

    response
}
