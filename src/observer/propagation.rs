//! W3C trace-context and baggage propagation.
//!
//! # Responsibilities
//! - Extract `traceparent` / `baggage` headers from inbound requests
//! - Inject the current span context into outbound header maps
//!
//! # Design Decisions
//! - Composite of the two concerns, mirroring a composite propagator;
//!   each half degrades independently on malformed input
//! - Only trace-context version 00 is accepted; zero IDs are rejected

use axum::http::header::{HeaderName, HeaderValue};
use axum::http::HeaderMap;

use crate::observer::trace::{SpanContext, SpanId, TraceId};
use crate::observer::{Context, Propagator};

pub const TRACEPARENT: HeaderName = HeaderName::from_static("traceparent");
pub const BAGGAGE: HeaderName = HeaderName::from_static("baggage");

/// Caps how many baggage entries a single request may carry.
const MAX_BAGGAGE_ENTRIES: usize = 64;

/// Composite propagator for trace-context plus baggage.
pub struct CompositePropagator;

impl CompositePropagator {
    pub fn new() -> Self {
        Self
    }

    /// Parse a `traceparent` value: `00-{trace-id}-{span-id}-{flags}`.
    fn parse_traceparent(value: &str) -> Option<SpanContext> {
        let mut parts = value.trim().split('-');
        let version = parts.next()?;
        if version.len() != 2 || version == "ff" {
            return None;
        }
        let trace_id = TraceId::from_hex(parts.next()?)?;
        let span_id = SpanId::from_hex(parts.next()?)?;
        let flags = u8::from_str_radix(parts.next()?, 16).ok()?;
        // Version 00 defines exactly four fields.
        if version == "00" && parts.next().is_some() {
            return None;
        }
        Some(SpanContext {
            trace_id,
            span_id,
            sampled: flags & 0x01 == 0x01,
        })
    }

    fn format_traceparent(span: &SpanContext) -> String {
        let flags = if span.sampled { 0x01u8 } else { 0x00 };
        format!("00-{}-{}-{:02x}", span.trace_id, span.span_id, flags)
    }

    fn parse_baggage(value: &str) -> Vec<(String, String)> {
        value
            .split(',')
            .take(MAX_BAGGAGE_ENTRIES)
            .filter_map(|entry| {
                let (key, value) = entry.split_once('=')?;
                let key = key.trim();
                if key.is_empty() {
                    return None;
                }
                Some((key.to_string(), value.trim().to_string()))
            })
            .collect()
    }

    fn format_baggage(baggage: &[(String, String)]) -> String {
        baggage
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for CompositePropagator {
    fn default() -> Self {
        Self::new()
    }
}

impl Propagator for CompositePropagator {
    fn extract(&self, headers: &HeaderMap) -> Context {
        let span = headers
            .get(TRACEPARENT)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse_traceparent);
        let baggage = headers
            .get(BAGGAGE)
            .and_then(|v| v.to_str().ok())
            .map(Self::parse_baggage)
            .unwrap_or_default();
        Context { span, baggage }
    }

    fn inject(&self, cx: &Context, headers: &mut HeaderMap) {
        if let Some(span) = cx.span.as_ref().filter(|s| s.is_valid()) {
            if let Ok(value) = HeaderValue::from_str(&Self::format_traceparent(span)) {
                headers.insert(TRACEPARENT, value);
            }
        }
        if !cx.baggage.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&Self::format_baggage(&cx.baggage)) {
                headers.insert(BAGGAGE, value);
            }
        }
    }
}
