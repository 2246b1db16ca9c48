//! Option combinators for tracing interceptors
//!
//! Each [`TraceOption`] is one configuration delta. A sequence of them is
//! applied in order over [`TraceSettings::default`]; when two options touch
//! the same field the later one wins.
//!
//! # Example
//!
//! ```rust
//! use rpctrace_core::{TraceOption, TraceSettings};
//!
//! let settings = TraceSettings::from_options([
//!     TraceOption::log_payloads(),
//!     TraceOption::including_spans(|_parent, method, _req, _resp| !method.ends_with("/Health")),
//! ]);
//!
//! assert!(settings.log_payloads());
//! assert!(settings.create_span());
//! ```

use crate::context::SpanContext;
use crate::payload::Payload;
use crate::settings::{
    SpanDecoration, SpanDecoratorFn, SpanInclusion, SpanInclusionFn, TraceSettings,
};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tracing::Span;

/// A single configuration step for a tracing interceptor.
#[derive(Clone)]
pub enum TraceOption {
    /// Attach request and response payloads to the span.
    LogPayloads,
    /// Create a span for the call (`true`) or only propagate the parent
    /// context (`false`).
    CreateSpan(bool),
    /// Decide per call whether to trace it at all.
    IncludingSpans(SpanInclusionFn),
    /// Annotate every created span once the call completes.
    SpanDecorator(SpanDecoratorFn),
}

impl TraceOption {
    /// Try to log application payloads in both directions.
    pub fn log_payloads() -> Self {
        Self::LogPayloads
    }

    /// Create a new span for the call.
    ///
    /// When `false`, the parent span context is still handed to the call if
    /// one is present, but no child span is started.
    pub fn create_span(create: bool) -> Self {
        Self::CreateSpan(create)
    }

    /// Install an inclusion predicate.
    ///
    /// The predicate receives the parent context (absent when none could be
    /// extracted), the method name, the request and the response if one
    /// exists yet. Return `true` to trace the call.
    pub fn including_spans<F>(predicate: F) -> Self
    where
        F: Fn(Option<&SpanContext>, &str, &dyn Payload, Option<&dyn Payload>) -> bool
            + Send
            + Sync
            + 'static,
    {
        Self::IncludingSpans(Arc::new(predicate))
    }

    /// Install a span decorator.
    ///
    /// The decorator runs once per completed, traced call and may record
    /// fields on or emit events inside the span.
    pub fn span_decorator<F>(decorator: F) -> Self
    where
        F: Fn(&Span, &str, &dyn Payload, Option<&dyn Payload>, Option<&(dyn Error + 'static)>)
            + Send
            + Sync
            + 'static,
    {
        Self::SpanDecorator(Arc::new(decorator))
    }

    /// Apply this option to `settings`, touching only the field it owns.
    pub fn apply_to(self, settings: &mut TraceSettings) {
        match self {
            Self::LogPayloads => settings.log_payloads = true,
            Self::CreateSpan(create) => settings.create_span = create,
            Self::IncludingSpans(predicate) => {
                settings.inclusion = SpanInclusion::Filter(predicate);
            }
            Self::SpanDecorator(decorator) => {
                settings.decoration = SpanDecoration::Decorate(decorator);
            }
        }
    }
}

impl fmt::Debug for TraceOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LogPayloads => f.write_str("LogPayloads"),
            Self::CreateSpan(create) => f.debug_tuple("CreateSpan").field(create).finish(),
            Self::IncludingSpans(_) => f.write_str("IncludingSpans(<fn>)"),
            Self::SpanDecorator(_) => f.write_str("SpanDecorator(<fn>)"),
        }
    }
}
