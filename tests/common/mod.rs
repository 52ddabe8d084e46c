//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::HeaderMap;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use status_service::config::ServiceConfig;
use status_service::http::HttpServer;
use status_service::lifecycle::Shutdown;
use status_service::observer::{
    CompositePropagator, Context, Logger, MetricSink, Observe, Propagator, RandomTracer,
    SpanContext, Tracer,
};
use status_service::status::{StatusCodeRegistry, StatusStore};

/// One log entry seen by the observer double.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: &'static str,
    pub message: String,
    pub trace_id: Option<String>,
}

/// Observer double recording everything it sees.
///
/// Tracing and propagation delegate to the real providers so the
/// facade's span wiring is exercised; logs and metrics are captured
/// for assertions.
#[derive(Default)]
pub struct TestObserver {
    pub logs: Mutex<Vec<LogEntry>>,
    pub requests: Mutex<Vec<(String, String, u16)>>,
    tracer: RandomTracer,
    propagator: CompositePropagator,
}

impl TestObserver {
    fn log(&self, level: &'static str, cx: &Context, msg: &str) {
        self.logs.lock().unwrap().push(LogEntry {
            level,
            message: msg.to_string(),
            trace_id: cx.span.map(|s| s.trace_id.to_string()),
        });
    }
}

impl Logger for TestObserver {
    fn debug(&self, cx: &Context, msg: &str) {
        self.log("debug", cx, msg);
    }

    fn info(&self, cx: &Context, msg: &str) {
        self.log("info", cx, msg);
    }

    fn error(&self, cx: &Context, msg: &str) {
        self.log("error", cx, msg);
    }

    fn fatal(&self, cx: &Context, msg: &str) {
        // Never terminate the test process.
        self.log("fatal", cx, msg);
    }
}

impl MetricSink for TestObserver {
    fn record_request(&self, route: &str, method: &str, status: u16, _elapsed: Duration) {
        self.requests
            .lock()
            .unwrap()
            .push((route.to_string(), method.to_string(), status));
    }
}

impl Tracer for TestObserver {
    fn start_span(&self, name: &str, parent: Option<&SpanContext>) -> SpanContext {
        self.tracer.start_span(name, parent)
    }

    fn end_span(&self, span: &SpanContext, name: &str, elapsed: Duration) {
        self.tracer.end_span(span, name, elapsed);
    }
}

impl Propagator for TestObserver {
    fn extract(&self, headers: &HeaderMap) -> Context {
        self.propagator.extract(headers)
    }

    fn inject(&self, cx: &Context, headers: &mut HeaderMap) {
        self.propagator.inject(cx, headers);
    }
}

/// Everything a test needs to talk to a running server instance.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub observer: Arc<TestObserver>,
    pub task: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    #[allow(dead_code)]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

/// Start an isolated server instance on an ephemeral port.
pub async fn spawn_server(store: Arc<StatusStore>) -> TestServer {
    let observer = Arc::new(TestObserver::default());
    let config = ServiceConfig::default();
    let server = HttpServer::new(&config, store, observer.clone() as Arc<dyn Observe>);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        shutdown,
        observer,
        task,
    }
}

/// Store with a deterministic registry seed.
#[allow(dead_code)]
pub fn seeded_store() -> Arc<StatusStore> {
    Arc::new(StatusStore::new(StatusCodeRegistry::with_seed(99)))
}
