//! Metric recording and the Prometheus exporter.
//!
//! # Metrics
//! - `status_requests_total` (counter): requests by route, method, status
//! - `status_request_duration_seconds` (histogram): latency by route, method
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade, so it is cheap and
//!   never fails request handling
//! - The exporter is pull-based: the recorder is installed during
//!   construction, the scrape listener is started as an explicit step

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

use crate::observer::{MetricSink, Resource};

pub const REQUESTS_TOTAL: &str = "status_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "status_request_duration_seconds";

/// Histogram buckets tuned for a handler that sleeps up to 500ms.
const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Handle to the installed Prometheus recorder plus the address the
/// scrape listener should bind once started.
pub(crate) struct PrometheusExporter {
    pub handle: PrometheusHandle,
    pub addr: SocketAddr,
}

/// Install the process-wide Prometheus recorder.
///
/// Resource attributes become global labels, so exposition output is
/// attributable to the service that produced it.
pub(crate) fn install_recorder(
    addr: SocketAddr,
    resource: &Resource,
) -> Result<PrometheusExporter, BuildError> {
    let mut builder = PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
        DURATION_BUCKETS,
    )?;
    for (key, value) in resource.attributes() {
        builder = builder.add_global_label(key, value);
    }
    let handle = builder.install_recorder()?;
    Ok(PrometheusExporter { handle, addr })
}

/// Metric-recording capability backed by the global recorder.
pub struct MetricRecorder;

impl MetricRecorder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MetricRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSink for MetricRecorder {
    fn record_request(&self, route: &str, method: &str, status: u16, elapsed: Duration) {
        counter!(
            REQUESTS_TOTAL,
            "route" => route.to_string(),
            "method" => method.to_string(),
            "status" => status.to_string()
        )
        .increment(1);
        histogram!(
            REQUEST_DURATION_SECONDS,
            "route" => route.to_string(),
            "method" => method.to_string()
        )
        .record(elapsed.as_secs_f64());
    }
}
