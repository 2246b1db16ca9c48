//! # rpctrace
//!
//! Composable tracing options for RPC interceptors.
//!
//! An interceptor is configured once, at construction, from a sequence of
//! [`TraceOption`]s. Each option sets one thing; the sequence is applied in
//! order over the defaults and the last option touching a field wins. The
//! resulting [`TraceSettings`] is then read, never written, on every call.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rpctrace::prelude::*;
//!
//! let interceptor = TracingInterceptor::client([
//!     TraceOption::log_payloads(),
//!     TraceOption::including_spans(|_parent, method, _req, _resp| {
//!         !method.starts_with("/grpc.health")
//!     }),
//!     TraceOption::span_decorator(|span, _method, _req, _resp, err| {
//!         if let Some(err) = err {
//!             span.record("error", true);
//!             tracing::warn!(parent: span, error = %err, "call failed");
//!         }
//!     }),
//! ]);
//!
//! let reply = interceptor
//!     .intercept(parent_ctx, "/greeter.Greeter/SayHello", request, |ctx, req| async move {
//!         transport.unary(ctx, req).await
//!     })
//!     .await?;
//! ```
//!
//! ## Optional Features
//!
//! - `config` - Read `RPCTRACE_*` environment variables into options
//! - `logging` - Install a formatted `tracing-subscriber`
//! - `full` - All optional features enabled

// Re-export core functionality
pub use rpctrace_core::*;

// Re-export extras (feature-gated)
#[cfg(feature = "config")]
pub use rpctrace_extras::config;
#[cfg(feature = "config")]
pub use rpctrace_extras::{load_dotenv, load_dotenv_from, ConfigError, TraceEnvConfig};

#[cfg(feature = "logging")]
pub use rpctrace_extras::logging;
#[cfg(feature = "logging")]
pub use rpctrace_extras::{init_logging, LoggingError};

// Re-export tracing for decorators
pub use tracing;

/// Prelude module - import everything you need with `use rpctrace::prelude::*`
pub mod prelude {
    pub use rpctrace_core::{
        Payload, SpanContext, SpanDecoration, SpanInclusion, SpanKind, TraceOption, TracePlan,
        TraceSettings, TracingInterceptor,
    };

    #[cfg(feature = "config")]
    pub use rpctrace_extras::{load_dotenv, TraceEnvConfig};

    #[cfg(feature = "logging")]
    pub use rpctrace_extras::init_logging;

    pub use tracing::Span;
}
