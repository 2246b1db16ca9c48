//! Span context carried across an RPC boundary
//!
//! A [`SpanContext`] identifies the trace a call belongs to and the span that
//! issued it. How it travels on the wire is up to the RPC framework; this
//! type only holds the identity and derives child contexts.

use std::fmt;
use uuid::Uuid;

/// Sampled bit of the trace flags
const FLAG_SAMPLED: u8 = 0x01;

/// Identity of a traced call
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpanContext {
    /// Trace ID (128-bit, hex encoded)
    pub trace_id: String,
    /// Span ID (64-bit, hex encoded)
    pub span_id: String,
    /// Span ID of the parent, if this context was derived from one
    pub parent_span_id: Option<String>,
    /// Trace flags (8 bits)
    pub trace_flags: u8,
}

impl SpanContext {
    /// Start a new trace with a fresh, sampled root context.
    pub fn new_root() -> Self {
        Self {
            trace_id: Self::generate_trace_id(),
            span_id: Self::generate_span_id(),
            parent_span_id: None,
            trace_flags: FLAG_SAMPLED,
        }
    }

    /// Build a context from IDs received from a remote peer.
    pub fn remote(trace_id: impl Into<String>, span_id: impl Into<String>, sampled: bool) -> Self {
        Self {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
            parent_span_id: None,
            trace_flags: if sampled { FLAG_SAMPLED } else { 0 },
        }
    }

    /// Derive a child context in the same trace.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: Self::generate_span_id(),
            parent_span_id: Some(self.span_id.clone()),
            trace_flags: self.trace_flags,
        }
    }

    /// Generate a new trace ID (128-bit, 32 hex chars)
    pub fn generate_trace_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Generate a new span ID (64-bit, 16 hex chars)
    ///
    /// Only the fully random bytes of a v4 UUID are used. Byte 6 carries the
    /// version nibble and byte 8 the variant bits, so both are skipped.
    pub fn generate_span_id() -> String {
        let bytes = Uuid::new_v4().into_bytes();
        let mut id = [0u8; 8];
        id[..6].copy_from_slice(&bytes[..6]);
        id[6..].copy_from_slice(&bytes[9..11]);
        format!("{:016x}", u64::from_be_bytes(id))
    }

    /// Check if trace is sampled
    pub fn is_sampled(&self) -> bool {
        self.trace_flags & FLAG_SAMPLED == FLAG_SAMPLED
    }

    /// Set sampled flag
    pub fn set_sampled(&mut self, sampled: bool) {
        if sampled {
            self.trace_flags |= FLAG_SAMPLED;
        } else {
            self.trace_flags &= !FLAG_SAMPLED;
        }
    }
}

impl fmt::Display for SpanContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.trace_id, self.span_id)
    }
}
