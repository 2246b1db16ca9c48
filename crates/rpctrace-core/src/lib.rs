//! # rpctrace-core
//!
//! Configuration and policy hooks for RPC tracing interceptors.
//!
//! Interceptors are configured with a sequence of [`TraceOption`]s. The
//! options are applied in order over the defaults to produce a
//! [`TraceSettings`], which the interceptor then reads on every call:
//!
//! - [`TraceOption::log_payloads`] attaches request and response payloads
//!   to spans
//! - [`TraceOption::create_span`] turns span creation on or off
//! - [`TraceOption::including_spans`] installs a per-call inclusion predicate
//! - [`TraceOption::span_decorator`] installs a hook that annotates spans
//!
//! [`TracingInterceptor`] is the consumer of these settings for unary calls,
//! built on the `tracing` crate.
//!
//! ## Example
//!
//! ```rust
//! use rpctrace_core::{TraceOption, TraceSettings};
//!
//! let settings = TraceSettings::from_options([
//!     TraceOption::log_payloads(),
//!     TraceOption::create_span(true),
//!     TraceOption::span_decorator(|span, method, _req, _resp, err| {
//!         if err.is_some() {
//!             tracing::warn!(parent: span, method, "call failed");
//!         }
//!     }),
//! ]);
//!
//! assert!(settings.log_payloads());
//! assert!(settings.inclusion().is_all());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod context;
pub mod interceptor;
pub mod option;
pub mod payload;
pub mod settings;

pub use context::SpanContext;
pub use interceptor::{SpanKind, TracePlan, TracingInterceptor};
pub use option::TraceOption;
pub use payload::Payload;
pub use settings::{
    SpanDecoration, SpanDecoratorFn, SpanInclusion, SpanInclusionFn, TraceSettings,
    TraceSettingsBuilder,
};
