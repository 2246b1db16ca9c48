//! Resolved tracing settings
//!
//! [`TraceSettings`] is built once per interceptor by applying a sequence of
//! [`TraceOption`]s over the defaults. The interceptor that built it keeps
//! it behind an `Arc` and only reads it from then on; settings are never
//! shared between interceptors.

use crate::context::SpanContext;
use crate::option::TraceOption;
use crate::payload::Payload;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tracing::Span;

/// Predicate deciding whether a call is traced at all
pub type SpanInclusionFn = Arc<
    dyn Fn(Option<&SpanContext>, &str, &dyn Payload, Option<&dyn Payload>) -> bool + Send + Sync,
>;

/// Hook adding custom annotations to the span of a completed call
pub type SpanDecoratorFn = Arc<
    dyn Fn(&Span, &str, &dyn Payload, Option<&dyn Payload>, Option<&(dyn Error + 'static)>)
        + Send
        + Sync,
>;

/// Inclusion policy
#[derive(Clone, Default)]
pub enum SpanInclusion {
    /// Trace every call.
    #[default]
    All,
    /// Trace only calls the predicate accepts.
    Filter(SpanInclusionFn),
}

impl SpanInclusion {
    /// Check if every call is traced
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Resolve the decision for one call.
    pub fn includes(
        &self,
        parent: Option<&SpanContext>,
        method: &str,
        request: &dyn Payload,
        response: Option<&dyn Payload>,
    ) -> bool {
        match self {
            Self::All => true,
            Self::Filter(predicate) => predicate(parent, method, request, response),
        }
    }
}

impl fmt::Debug for SpanInclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Filter(_) => f.write_str("Filter(<fn>)"),
        }
    }
}

/// Decoration policy
#[derive(Clone, Default)]
pub enum SpanDecoration {
    /// Leave spans as the interceptor created them.
    #[default]
    None,
    /// Run the decorator on every completed span.
    Decorate(SpanDecoratorFn),
}

impl SpanDecoration {
    /// Check if no decorator is installed
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Run the decorator, if any.
    pub fn apply(
        &self,
        span: &Span,
        method: &str,
        request: &dyn Payload,
        response: Option<&dyn Payload>,
        error: Option<&(dyn Error + 'static)>,
    ) {
        if let Self::Decorate(decorator) = self {
            decorator(span, method, request, response, error);
        }
    }
}

impl fmt::Debug for SpanDecoration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Decorate(_) => f.write_str("Decorate(<fn>)"),
        }
    }
}

/// Configuration consumed by a tracing interceptor on every call.
///
/// Defaults: payload logging off, span creation on, every call included,
/// no decorator.
///
/// No combination is rejected. A decorator installed together with
/// `create_span(false)` is stored but never runs, since no span exists to
/// decorate.
#[derive(Clone, Debug)]
pub struct TraceSettings {
    pub(crate) log_payloads: bool,
    pub(crate) create_span: bool,
    pub(crate) inclusion: SpanInclusion,
    pub(crate) decoration: SpanDecoration,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            log_payloads: false,
            create_span: true,
            inclusion: SpanInclusion::All,
            decoration: SpanDecoration::None,
        }
    }
}

impl TraceSettings {
    /// Create settings with the default baseline
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `options` over the default baseline.
    pub fn from_options<I>(options: I) -> Self
    where
        I: IntoIterator<Item = TraceOption>,
    {
        let mut settings = Self::default();
        settings.apply(options);
        settings
    }

    /// Create a new TraceSettings builder
    pub fn builder() -> TraceSettingsBuilder {
        TraceSettingsBuilder::default()
    }

    /// Apply options in iteration order. Later options overwrite fields set
    /// by earlier ones.
    pub fn apply<I>(&mut self, options: I)
    where
        I: IntoIterator<Item = TraceOption>,
    {
        for option in options {
            option.apply_to(self);
        }
    }

    /// Whether request and response payloads are attached to spans
    pub fn log_payloads(&self) -> bool {
        self.log_payloads
    }

    /// Whether a new span is created for included calls
    pub fn create_span(&self) -> bool {
        self.create_span
    }

    /// Installed inclusion policy
    pub fn inclusion(&self) -> &SpanInclusion {
        &self.inclusion
    }

    /// Installed decoration policy
    pub fn decoration(&self) -> &SpanDecoration {
        &self.decoration
    }

    /// Resolve whether a call should be traced.
    pub fn should_include(
        &self,
        parent: Option<&SpanContext>,
        method: &str,
        request: &dyn Payload,
        response: Option<&dyn Payload>,
    ) -> bool {
        self.inclusion.includes(parent, method, request, response)
    }

    /// Run the decorator on a completed span. No-op when none is installed.
    pub fn decorate(
        &self,
        span: &Span,
        method: &str,
        request: &dyn Payload,
        response: Option<&dyn Payload>,
        error: Option<&(dyn Error + 'static)>,
    ) {
        self.decoration.apply(span, method, request, response, error);
    }
}

/// Builder for TraceSettings
///
/// Options are recorded in call order and applied on [`build`](Self::build),
/// so the last call touching a field wins.
#[derive(Default)]
pub struct TraceSettingsBuilder {
    options: Vec<TraceOption>,
}

impl TraceSettingsBuilder {
    /// Enable payload logging
    pub fn log_payloads(self) -> Self {
        self.option(TraceOption::log_payloads())
    }

    /// Enable or disable span creation
    pub fn create_span(self, create: bool) -> Self {
        self.option(TraceOption::create_span(create))
    }

    /// Set the inclusion predicate
    pub fn including_spans<F>(self, predicate: F) -> Self
    where
        F: Fn(Option<&SpanContext>, &str, &dyn Payload, Option<&dyn Payload>) -> bool
            + Send
            + Sync
            + 'static,
    {
        self.option(TraceOption::including_spans(predicate))
    }

    /// Set the span decorator
    pub fn span_decorator<F>(self, decorator: F) -> Self
    where
        F: Fn(&Span, &str, &dyn Payload, Option<&dyn Payload>, Option<&(dyn Error + 'static)>)
            + Send
            + Sync
            + 'static,
    {
        self.option(TraceOption::span_decorator(decorator))
    }

    /// Add a prebuilt option
    pub fn option(mut self, option: TraceOption) -> Self {
        self.options.push(option);
        self
    }

    /// Add multiple prebuilt options
    pub fn options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = TraceOption>,
    {
        self.options.extend(options);
        self
    }

    /// Build the TraceSettings
    pub fn build(self) -> TraceSettings {
        TraceSettings::from_options(self.options)
    }
}
