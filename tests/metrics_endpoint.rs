//! Lifecycle test for the real Observer with a Prometheus exporter.
//!
//! Kept in its own binary: installing the Prometheus recorder is a
//! process-wide, once-only operation.

use std::time::Duration;

use status_service::lifecycle::Shutdown;
use status_service::observer::{MetricSink, Observer, Service};

#[tokio::test]
async fn metrics_are_exposed_and_the_listener_shuts_down_cleanly() {
    let observer = Observer::builder(Service {
        name: "metrics-tests".to_string(),
        version: "0.0.0".to_string(),
    })
    .with_prometheus_exporter("127.0.0.1:0".parse().unwrap())
    .build()
    .await
    .unwrap();

    let shutdown = Shutdown::new();
    let addr = observer.serve_metrics(shutdown.subscribe()).await.unwrap();

    observer.record_request("/status", "GET", 200, Duration::from_millis(5));

    let body = reqwest::get(format!("http://{addr}/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("status_requests_total"), "{body}");
    assert!(body.contains("status_request_duration_seconds"), "{body}");
    // Resource attributes surface as global labels.
    assert!(body.contains("service_name=\"metrics-tests\""), "{body}");
    assert!(body.contains("route=\"/status\""), "{body}");

    shutdown.trigger();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    observer.shutdown(deadline).await.unwrap();
}
