//! Composed observability: logging, metrics, tracing, propagation.
//!
//! # Data Flow
//! ```text
//! Observer::builder(service)      construction, options in caller order
//!     .with_json_logger(..)       → tracing JSON subscriber + flush action
//!     .with_prometheus_exporter() → metrics recorder + scrape handle
//!     .with_stdout_tracer()       → finished-span export
//!     .build()                    → Observer, shutdown actions ordered
//!
//! Request handlers   → Logger / MetricSink / Tracer / Propagator traits
//! Process controller → serve_metrics() once, shutdown(deadline) once
//! ```
//!
//! # Design Decisions
//! - One field per capability; consumers depend on `Arc<dyn Observe>`,
//!   so test doubles implement only what they exercise
//! - Shutdown actions run in registration order, continue past
//!   failures, and aggregate every failure into one error
//! - A failing option releases resources registered by earlier options
//!   before construction reports the error
//! - The metrics listener is started by an explicit step, never as a
//!   construction side effect

pub mod logger;
pub mod metrics;
pub mod propagation;
pub mod trace;

pub use logger::JsonLogger;
pub use metrics::MetricRecorder;
pub use propagation::CompositePropagator;
pub use trace::{RandomTracer, SpanContext, SpanId, TraceId};

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use axum::http::HeaderMap;
use axum::routing::get;
use axum::Router;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::observer::metrics::PrometheusExporter;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type ShutdownFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;
type ShutdownFn = Box<dyn FnOnce() -> ShutdownFuture + Send>;

/// Request-scoped telemetry context flowing through handlers.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub span: Option<SpanContext>,
    pub baggage: Vec<(String, String)>,
}

impl Context {
    /// Context without span identity, for process-level log lines.
    pub fn root() -> Self {
        Self::default()
    }
}

/// Identity attached to every telemetry signal this process emits.
#[derive(Debug, Clone)]
pub struct Service {
    pub name: String,
    pub version: String,
}

/// Service identity merged with default environment attributes.
///
/// Established during construction; later options reuse it (the
/// Prometheus exporter turns it into global labels).
#[derive(Debug, Clone)]
pub struct Resource {
    attributes: Vec<(String, String)>,
}

impl Resource {
    fn new(service: &Service) -> Self {
        Self {
            attributes: vec![
                ("service_name".to_string(), service.name.clone()),
                ("service_version".to_string(), service.version.clone()),
                ("telemetry_sdk_language".to_string(), "rust".to_string()),
            ],
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Logging capability. `fatal` flushes and terminates the process.
pub trait Logger: Send + Sync {
    fn debug(&self, cx: &Context, msg: &str);
    fn info(&self, cx: &Context, msg: &str);
    fn error(&self, cx: &Context, msg: &str);
    fn fatal(&self, cx: &Context, msg: &str);
}

/// Metric-recording capability. Best-effort; never fails the caller.
pub trait MetricSink: Send + Sync {
    fn record_request(&self, route: &str, method: &str, status: u16, elapsed: Duration);
}

/// Trace-provider capability.
pub trait Tracer: Send + Sync {
    fn start_span(&self, name: &str, parent: Option<&SpanContext>) -> SpanContext;
    fn end_span(&self, span: &SpanContext, name: &str, elapsed: Duration);
}

/// Context-propagation capability over HTTP header maps.
pub trait Propagator: Send + Sync {
    fn extract(&self, headers: &HeaderMap) -> Context;
    fn inject(&self, cx: &Context, headers: &mut HeaderMap);
}

/// The unified capability surface consumers depend on.
pub trait Observe: Logger + MetricSink + Tracer + Propagator {}

impl<T: Logger + MetricSink + Tracer + Propagator> Observe for T {}

/// Construction and startup failures. Fatal to the process.
#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("option '{name}' failed: {source}")]
    Option { name: &'static str, source: BoxError },

    #[error("metrics exporter is not configured")]
    MetricsNotConfigured,

    #[error("binding metrics listener: {0}")]
    MetricsBind(#[source] std::io::Error),
}

/// One shutdown action that did not complete.
#[derive(Debug)]
pub struct ShutdownFailure {
    pub action: String,
    pub message: String,
}

/// Aggregation of every shutdown action failure; reported to the
/// operator, never to a client.
#[derive(Debug)]
pub struct ShutdownError {
    pub failures: Vec<ShutdownFailure>,
}

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} shutdown action(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.action, failure.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ShutdownError {}

struct ShutdownAction {
    name: String,
    run: ShutdownFn,
}

/// Single point of access for cross-cutting concerns.
///
/// Constructed once at process start, shared read-mostly by every
/// request-handling path. The process controller owns the lifecycle:
/// construct, use, shut down exactly once.
pub struct Observer {
    resource: Resource,
    logger: JsonLogger,
    recorder: MetricRecorder,
    tracer: RandomTracer,
    propagator: CompositePropagator,
    exporter: Option<PrometheusExporter>,
    logger_installed: bool,
    actions: Mutex<Vec<ShutdownAction>>,
}

/// A named unit of Observer setup, applied in caller order.
pub struct ObserverOption {
    name: &'static str,
    apply: Box<dyn FnOnce(&mut Observer) -> Result<(), BoxError> + Send>,
}

/// Ordered-option builder for [`Observer`].
pub struct ObserverBuilder {
    service: Service,
    options: Vec<ObserverOption>,
}

impl ObserverBuilder {
    /// Attach the JSON stdout logger and register its flush action.
    pub fn with_json_logger(self, default_level: impl Into<String>) -> Self {
        let level = default_level.into();
        self.option("json logger", move |observer| {
            logger::init_subscriber(&level)?;
            observer.logger_installed = true;
            Ok(())
        })
    }

    /// Install the Prometheus recorder and remember the scrape address.
    ///
    /// The listener itself is started later via
    /// [`Observer::serve_metrics`].
    pub fn with_prometheus_exporter(self, addr: SocketAddr) -> Self {
        self.option("prometheus exporter", move |observer| {
            observer.exporter = Some(metrics::install_recorder(addr, &observer.resource)?);
            Ok(())
        })
    }

    /// Export finished spans as structured log lines.
    pub fn with_stdout_tracer(self) -> Self {
        self.option("stdout tracer", |observer| {
            observer.tracer.enable_stdout_export();
            Ok(())
        })
    }

    /// Append a custom named option.
    pub fn option<F>(mut self, name: &'static str, apply: F) -> Self
    where
        F: FnOnce(&mut Observer) -> Result<(), BoxError> + Send + 'static,
    {
        self.options.push(ObserverOption {
            name,
            apply: Box::new(apply),
        });
        self
    }

    /// Apply every option in order and fix the shutdown sequence.
    ///
    /// On option failure, shutdown actions registered by earlier
    /// options run best-effort before the error is returned, so no
    /// partially-built resources leak.
    pub async fn build(self) -> Result<Observer, ObserverError> {
        let mut observer = Observer {
            resource: Resource::new(&self.service),
            logger: JsonLogger::new(),
            recorder: MetricRecorder::new(),
            tracer: RandomTracer::new(),
            propagator: CompositePropagator::new(),
            exporter: None,
            logger_installed: false,
            actions: Mutex::new(Vec::new()),
        };

        for option in self.options {
            if let Err(source) = (option.apply)(&mut observer) {
                observer.release_registered_actions().await;
                return Err(ObserverError::Option {
                    name: option.name,
                    source,
                });
            }
        }

        // Fixed teardown order: logger, trace provider, metrics
        // provider, then option-contributed actions as they were added.
        let contributed = observer.drain_actions();
        let mut actions = Vec::new();
        if observer.logger_installed {
            actions.push(ShutdownAction {
                name: "logger".to_string(),
                run: Box::new(|| -> ShutdownFuture { Box::pin(logger::flush()) }),
            });
        }
        actions.push(ShutdownAction {
            name: "trace provider".to_string(),
            // Span export is synchronous; nothing is buffered.
            run: Box::new(|| -> ShutdownFuture { Box::pin(async { Ok(()) }) }),
        });
        if let Some(handle) = observer.exporter.as_ref().map(|e| e.handle.clone()) {
            actions.push(ShutdownAction {
                name: "metrics provider".to_string(),
                run: Box::new(move || -> ShutdownFuture {
                    Box::pin(async move {
                        handle.run_upkeep();
                        Ok(())
                    })
                }),
            });
        }
        actions.extend(contributed);
        *observer
            .actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = actions;

        Ok(observer)
    }
}

impl Observer {
    pub fn builder(service: Service) -> ObserverBuilder {
        ObserverBuilder {
            service,
            options: Vec::new(),
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Register a cleanup action to run during [`Observer::shutdown`].
    pub fn defer_shutdown<F, Fut>(&self, name: &str, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ShutdownAction {
                name: name.to_string(),
                run: Box::new(move || -> ShutdownFuture { Box::pin(action()) }),
            });
    }

    /// Start the metrics exposition listener.
    ///
    /// Explicit startup step: bind errors surface here, synchronously,
    /// instead of inside a background task. The listener drains on the
    /// shutdown signal and its completion is awaited as a registered
    /// shutdown action. Returns the bound address.
    pub async fn serve_metrics(
        &self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<SocketAddr, ObserverError> {
        let exporter = self
            .exporter
            .as_ref()
            .ok_or(ObserverError::MetricsNotConfigured)?;
        let handle = exporter.handle.clone();

        let listener = tokio::net::TcpListener::bind(exporter.addr)
            .await
            .map_err(ObserverError::MetricsBind)?;
        let addr = listener.local_addr().map_err(ObserverError::MetricsBind)?;

        let router = Router::new().route(
            "/metrics",
            get(move || {
                let handle = handle.clone();
                async move { handle.render() }
            }),
        );

        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.recv().await;
                })
                .await
        });

        self.defer_shutdown("metrics listener", move || async move {
            match task.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(BoxError::from(e)),
                Err(e) => Err(BoxError::from(e)),
            }
        });

        Ok(addr)
    }

    /// Run every registered shutdown action in order.
    ///
    /// Each action is bounded by `deadline`; failures do not stop
    /// later actions and are aggregated into one [`ShutdownError`].
    /// The action list is drained, so a second call finds nothing to
    /// run; callers are still expected to invoke this exactly once.
    pub async fn shutdown(&self, deadline: tokio::time::Instant) -> Result<(), ShutdownError> {
        let mut failures = Vec::new();
        for action in self.drain_actions() {
            match tokio::time::timeout_at(deadline, (action.run)()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failures.push(ShutdownFailure {
                    action: action.name,
                    message: e.to_string(),
                }),
                Err(_) => failures.push(ShutdownFailure {
                    action: action.name,
                    message: "deadline exceeded".to_string(),
                }),
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShutdownError { failures })
        }
    }

    fn drain_actions(&self) -> Vec<ShutdownAction> {
        std::mem::take(
            &mut *self
                .actions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    async fn release_registered_actions(&self) {
        for action in self.drain_actions() {
            let _ = (action.run)().await;
        }
    }
}

impl Logger for Observer {
    fn debug(&self, cx: &Context, msg: &str) {
        self.logger.debug(cx, msg);
    }

    fn info(&self, cx: &Context, msg: &str) {
        self.logger.info(cx, msg);
    }

    fn error(&self, cx: &Context, msg: &str) {
        self.logger.error(cx, msg);
    }

    fn fatal(&self, cx: &Context, msg: &str) {
        self.logger.fatal(cx, msg);
    }
}

impl MetricSink for Observer {
    fn record_request(&self, route: &str, method: &str, status: u16, elapsed: Duration) {
        self.recorder.record_request(route, method, status, elapsed);
    }
}

impl Tracer for Observer {
    fn start_span(&self, name: &str, parent: Option<&SpanContext>) -> SpanContext {
        self.tracer.start_span(name, parent)
    }

    fn end_span(&self, span: &SpanContext, name: &str, elapsed: Duration) {
        self.tracer.end_span(span, name, elapsed);
    }
}

impl Propagator for Observer {
    fn extract(&self, headers: &HeaderMap) -> Context {
        self.propagator.extract(headers)
    }

    fn inject(&self, cx: &Context, headers: &mut HeaderMap) {
        self.propagator.inject(cx, headers);
    }
}
