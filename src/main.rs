use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use status_service::config;
use status_service::http::HttpServer;
use status_service::lifecycle::{self, Shutdown};
use status_service::observer::{Context, Logger, Observe, Observer, Service};
use status_service::status::{StatusCodeRegistry, StatusStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = config::load(config_path.as_deref())?;

    let service = Service {
        name: config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let mut builder =
        Observer::builder(service).with_json_logger(config.observability.log_level.clone());
    if config.observability.metrics_enabled {
        builder = builder.with_prometheus_exporter(config.observability.metrics_address.parse()?);
    }
    if config.observability.stdout_traces {
        builder = builder.with_stdout_tracer();
    }
    // Construction errors abort startup before any listener binds.
    let observer = Arc::new(builder.build().await?);

    let cx = Context::root();
    let shutdown = Shutdown::new();

    if config.observability.metrics_enabled {
        let addr = observer.serve_metrics(shutdown.subscribe()).await?;
        observer.info(&cx, &format!("starting metrics server on '{addr}'"));
    }

    let store = Arc::new(StatusStore::new(StatusCodeRegistry::new()));
    let server = HttpServer::new(&config, store, observer.clone() as Arc<dyn Observe>);

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    observer.info(
        &cx,
        &format!("starting status server on '{}'", listener.local_addr()?),
    );

    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let mut serve_result = Ok(());
    tokio::select! {
        res = &mut server_task => {
            serve_result = flatten(res);
            observer.error(&cx, "status server exited unexpectedly");
            shutdown.trigger();
        }
        _ = lifecycle::wait_for_signal() => {
            observer.info(&cx, "shutdown signal received");
            shutdown.trigger();
        }
    }

    // Drain and tear down within one shared grace period.
    let deadline =
        tokio::time::Instant::now() + Duration::from_secs(config.server.shutdown_grace_secs);

    if !server_task.is_finished() {
        match tokio::time::timeout_at(deadline, &mut server_task).await {
            Ok(res) => serve_result = serve_result.and(flatten(res)),
            Err(_) => {
                observer.error(&cx, "drain deadline exceeded, aborting status server");
                server_task.abort();
            }
        }
    }

    if let Err(e) = observer.shutdown(deadline).await {
        tracing::error!(error = %e, "shutdown incomplete");
    }

    serve_result.map_err(Into::into)
}

fn flatten(res: Result<std::io::Result<()>, tokio::task::JoinError>) -> std::io::Result<()> {
    match res {
        Ok(serve) => serve,
        Err(join) => Err(std::io::Error::other(join)),
    }
}
