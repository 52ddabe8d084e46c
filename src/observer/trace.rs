//! Span identity and the always-on trace provider.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::Rng;

use crate::observer::Tracer;

/// Wire identifiers are exactly lowercase hex; `from_str_radix` alone
/// would also accept `+` signs and uppercase digits.
fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// 128-bit trace identifier, hex-encoded on the wire. All-zero is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(pub u128);

impl TraceId {
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let id = rng.gen::<u128>();
            if id != 0 {
                return Self(id);
            }
        }
    }

    /// Parse 32 lowercase hex characters; rejects the all-zero identifier.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 32 || !is_lower_hex(s) {
            return None;
        }
        match u128::from_str_radix(s, 16) {
            Ok(0) | Err(_) => None,
            Ok(id) => Some(Self(id)),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// 64-bit span identifier, hex-encoded on the wire. All-zero is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanId(pub u64);

impl SpanId {
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let id = rng.gen::<u64>();
            if id != 0 {
                return Self(id);
            }
        }
    }

    /// Parse 16 lowercase hex characters; rejects the all-zero identifier.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 16 || !is_lower_hex(s) {
            return None;
        }
        match u64::from_str_radix(s, 16) {
            Ok(0) | Err(_) => None,
            Ok(id) => Some(Self(id)),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Identity of one span within a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub sampled: bool,
}

impl SpanContext {
    pub fn is_valid(&self) -> bool {
        self.trace_id.is_valid() && self.span_id.is_valid()
    }
}

/// Always-sampling trace provider with random span identity.
///
/// Finished spans are exported as structured log lines when stdout
/// export is enabled (the demo stand-in for an OTLP exporter).
pub struct RandomTracer {
    export_spans: AtomicBool,
}

impl RandomTracer {
    pub fn new() -> Self {
        Self {
            export_spans: AtomicBool::new(false),
        }
    }

    pub fn enable_stdout_export(&self) {
        self.export_spans.store(true, Ordering::Relaxed);
    }
}

impl Default for RandomTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracer for RandomTracer {
    fn start_span(&self, _name: &str, parent: Option<&SpanContext>) -> SpanContext {
        let trace_id = match parent {
            Some(p) if p.is_valid() => p.trace_id,
            _ => TraceId::random(),
        };
        SpanContext {
            trace_id,
            span_id: SpanId::random(),
            sampled: true,
        }
    }

    fn end_span(&self, span: &SpanContext, name: &str, elapsed: Duration) {
        if !self.export_spans.load(Ordering::Relaxed) {
            return;
        }
        tracing::debug!(
            target: "status_service::span",
            trace_id = %span.trace_id,
            span_id = %span.span_id,
            name,
            duration_ms = elapsed.as_millis() as u64,
            "span completed"
        );
    }
}
