//! Structured logging with span enrichment.
//!
//! Entries are emitted through the `tracing` facade; the JSON
//! subscriber installed by the logger option renders them with
//! timestamp, severity, target, message and caller fields. When the supplied
//! context carries a valid span, entries gain `trace_id` and
//! `span_id` fields so log consumers can join logs to traces.

use std::io::Write;

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::observer::{BoxError, Context, Logger};

/// `tracing`-backed logger; levels must be compile-time constants, so
/// each severity expands the same enriched/plain pair.
macro_rules! emit {
    ($level:ident, $cx:expr, $msg:expr) => {
        match $cx.span.as_ref().filter(|s| s.is_valid()) {
            Some(span) => tracing::$level!(
                trace_id = %span.trace_id,
                span_id = %span.span_id,
                "{}",
                $msg
            ),
            None => tracing::$level!("{}", $msg),
        }
    };
}

/// Logger capability writing JSON entries to stdout.
///
/// Events are no-ops until a subscriber is installed, so an Observer
/// built without the logger option stays safe to log through.
pub struct JsonLogger;

impl JsonLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for JsonLogger {
    fn debug(&self, cx: &Context, msg: &str) {
        emit!(debug, cx, msg);
    }

    fn info(&self, cx: &Context, msg: &str) {
        emit!(info, cx, msg);
    }

    fn error(&self, cx: &Context, msg: &str) {
        emit!(error, cx, msg);
    }

    fn fatal(&self, cx: &Context, msg: &str) {
        emit!(error, cx, msg);
        let _ = std::io::stdout().flush();
        // Terminal action, not a recoverable error.
        std::process::exit(1);
    }
}

/// Install the process-wide JSON subscriber.
///
/// `RUST_LOG` overrides the configured level. Fails if a global
/// subscriber is already installed.
pub(crate) fn init_subscriber(default_level: &str) -> Result<(), BoxError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer(std::io::stdout))
        .try_init()?;
    Ok(())
}

/// The JSON formatting layer: timestamp, severity, target, message,
/// caller location, plus whatever fields the event carries.
fn json_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(writer)
}

/// Flush-on-shutdown action for the logger.
pub(crate) async fn flush() -> Result<(), BoxError> {
    std::io::stdout().flush()?;
    Ok(())
}
