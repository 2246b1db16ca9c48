//! Tracing interceptor for unary RPC calls
//!
//! [`TracingInterceptor`] wraps one call with the policy held in its
//! [`TraceSettings`]:
//!
//! 1. the inclusion policy is asked whether to trace the call;
//! 2. excluded calls, and all calls when span creation is off, run with the
//!    parent context handed through unchanged;
//! 3. otherwise an `rpc.call` span is opened for a child context and the
//!    call runs inside it;
//! 4. once the call completes, payloads are logged if enabled and the
//!    decorator runs with the span, the request, and the response or error.
//!
//! Panics raised by the inclusion predicate or decorator are not caught.
//!
//! # Example
//!
//! ```rust,ignore
//! use rpctrace_core::{SpanContext, TraceOption, TracingInterceptor};
//!
//! let interceptor = TracingInterceptor::client([TraceOption::log_payloads()]);
//!
//! let reply = interceptor
//!     .intercept(parent, "/greeter.Greeter/SayHello", request, |ctx, req| async move {
//!         channel.say_hello(ctx, &req).await
//!     })
//!     .await?;
//! ```

use crate::context::SpanContext;
use crate::option::TraceOption;
use crate::payload::Payload;
use crate::settings::TraceSettings;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{field, info_span, Instrument};

/// Side of the call the interceptor runs on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanKind {
    /// Outgoing call
    Client,
    /// Incoming call
    Server,
}

impl SpanKind {
    /// OpenTelemetry span kind name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }
}

impl fmt::Display for SpanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the interceptor does with one call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TracePlan {
    /// Hand the parent context to the call without opening a span.
    Propagate(Option<SpanContext>),
    /// Open a span for this context, derived from the parent.
    Span(SpanContext),
}

/// Interceptor applying [`TraceSettings`] to each call it wraps.
///
/// Each interceptor owns the settings it was built with. Cloning is cheap and
/// clones of one interceptor read the same settings; separately constructed
/// interceptors never share them.
#[derive(Clone, Debug)]
pub struct TracingInterceptor {
    kind: SpanKind,
    settings: Arc<TraceSettings>,
}

impl TracingInterceptor {
    /// Create an interceptor from resolved settings
    pub fn new(kind: SpanKind, settings: TraceSettings) -> Self {
        Self {
            kind,
            settings: Arc::new(settings),
        }
    }

    /// Client interceptor configured by `options` over the defaults
    pub fn client<I>(options: I) -> Self
    where
        I: IntoIterator<Item = TraceOption>,
    {
        Self::new(SpanKind::Client, TraceSettings::from_options(options))
    }

    /// Server interceptor configured by `options` over the defaults
    pub fn server<I>(options: I) -> Self
    where
        I: IntoIterator<Item = TraceOption>,
    {
        Self::new(SpanKind::Server, TraceSettings::from_options(options))
    }

    /// Side of the call this interceptor runs on
    pub fn kind(&self) -> SpanKind {
        self.kind
    }

    /// Settings consulted on every call
    pub fn settings(&self) -> &TraceSettings {
        &self.settings
    }

    /// Decide how to handle a call before it runs.
    ///
    /// The inclusion policy is always consulted first, with no response.
    pub fn plan(
        &self,
        parent: Option<SpanContext>,
        method: &str,
        request: &dyn Payload,
    ) -> TracePlan {
        let settings = &self.settings;
        let included = settings.should_include(parent.as_ref(), method, request, None);

        if !included || !settings.create_span() {
            return TracePlan::Propagate(parent);
        }

        let context = match &parent {
            Some(parent) => parent.child(),
            None => SpanContext::new_root(),
        };
        TracePlan::Span(context)
    }

    /// Run `call` under this interceptor's tracing policy.
    ///
    /// `call` receives the context to propagate downstream: the new span's
    /// context when one was opened, otherwise `parent` unchanged. The call's
    /// result is returned as-is.
    pub async fn intercept<Req, Resp, E, F, Fut>(
        &self,
        parent: Option<SpanContext>,
        method: &str,
        request: Req,
        call: F,
    ) -> Result<Resp, E>
    where
        Req: Payload,
        Resp: Payload,
        E: Error + 'static,
        F: FnOnce(Option<SpanContext>, Arc<Req>) -> Fut,
        Fut: Future<Output = Result<Resp, E>>,
    {
        let request = Arc::new(request);

        let plan = self.plan(parent, method, &*request);
        let context = match plan {
            TracePlan::Propagate(parent) => {
                tracing::trace!(method = %method, kind = %self.kind, "rpc call not traced");
                return call(parent, request).await;
            }
            TracePlan::Span(context) => context,
        };

        let span = info_span!(
            "rpc.call",
            otel.name = %method,
            otel.kind = self.kind.as_str(),
            rpc.method = %method,
            trace_id = %context.trace_id,
            span_id = %context.span_id,
            parent_span_id = context.parent_span_id.as_deref().unwrap_or("none"),
            duration_ms = field::Empty,
            error = field::Empty,
        );

        if self.settings.log_payloads() {
            tracing::debug!(
                parent: &span,
                rpc.payload = "request",
                payload = ?request,
                "rpc payload"
            );
        }

        let start = Instant::now();
        let result = call(Some(context), request.clone())
            .instrument(span.clone())
            .await;
        let duration_ms = whole_millis(start.elapsed());

        span.record("duration_ms", duration_ms);

        match &result {
            Ok(response) => {
                if self.settings.log_payloads() {
                    tracing::debug!(
                        parent: &span,
                        rpc.payload = "response",
                        payload = ?response,
                        "rpc payload"
                    );
                }
                tracing::debug!(
                    parent: &span,
                    method = %method,
                    duration_ms = duration_ms,
                    "rpc completed"
                );
            }
            Err(err) => {
                span.record("error", true);
                tracing::warn!(
                    parent: &span,
                    method = %method,
                    duration_ms = duration_ms,
                    error = %err,
                    "rpc failed"
                );
            }
        }

        let response = result.as_ref().ok().map(|r| r as &dyn Payload);
        let error = result.as_ref().err().map(|e| e as &(dyn Error + 'static));
        self.settings.decorate(&span, method, &*request, response, error);

        result
    }
}

/// Milliseconds in `elapsed`, saturating at `u64::MAX`
fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct HelloRequest {
        name: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct HelloReply {
        message: String,
    }

    #[derive(Debug)]
    struct Unavailable;

    impl fmt::Display for Unavailable {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("service unavailable")
        }
    }

    impl Error for Unavailable {}

    fn hello(name: &str) -> HelloRequest {
        HelloRequest {
            name: name.to_string(),
        }
    }

    fn skip_health_checks() -> TraceOption {
        TraceOption::including_spans(|_, method, _, _| !method.starts_with("/grpc.health"))
    }

    fn counting_decorator(hits: Arc<AtomicUsize>) -> TraceOption {
        TraceOption::span_decorator(move |_, _, _, _, _| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_plan_default_opens_child_span() {
        let interceptor = TracingInterceptor::client([]);
        let parent = SpanContext::new_root();

        match interceptor.plan(Some(parent.clone()), "/svc/Hello", &hello("a")) {
            TracePlan::Span(ctx) => {
                assert_eq!(ctx.trace_id, parent.trace_id);
                assert_eq!(ctx.parent_span_id, Some(parent.span_id));
            }
            other => panic!("expected span, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_without_parent_starts_root() {
        let interceptor = TracingInterceptor::server([]);
        match interceptor.plan(None, "/svc/Hello", &hello("a")) {
            TracePlan::Span(ctx) => assert!(ctx.parent_span_id.is_none()),
            other => panic!("expected span, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_create_span_disabled_propagates() {
        let interceptor = TracingInterceptor::client([TraceOption::create_span(false)]);
        let parent = SpanContext::new_root();

        assert_eq!(
            interceptor.plan(Some(parent.clone()), "/svc/Hello", &hello("a")),
            TracePlan::Propagate(Some(parent))
        );
        assert_eq!(
            interceptor.plan(None, "/svc/Hello", &hello("a")),
            TracePlan::Propagate(None)
        );
    }

    #[test]
    fn test_plan_consults_predicate_even_without_span_creation() {
        let asked = Arc::new(AtomicUsize::new(0));
        let counter = asked.clone();
        let interceptor = TracingInterceptor::client([
            TraceOption::create_span(false),
            TraceOption::including_spans(move |_, _, _, resp| {
                counter.fetch_add(1, Ordering::SeqCst);
                resp.is_none()
            }),
        ]);

        interceptor.plan(None, "/svc/Hello", &hello("a"));
        assert_eq!(asked.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_plan_predicate_filters_by_method() {
        let interceptor = TracingInterceptor::server([skip_health_checks()]);

        assert!(matches!(
            interceptor.plan(None, "/grpc.health.v1.Health/Check", &()),
            TracePlan::Propagate(None)
        ));
        assert!(matches!(interceptor.plan(None, "/svc/Hello", &()), TracePlan::Span(_)));
    }

    #[tokio::test]
    async fn test_intercept_passes_child_context_and_result() {
        let interceptor = TracingInterceptor::client([]);
        let parent = SpanContext::new_root();
        let expected_trace = parent.trace_id.clone();
        let expected_parent = parent.span_id.clone();

        let reply = interceptor
            .intercept(Some(parent), "/svc/Hello", hello("ada"), |ctx, req| async move {
                let ctx = ctx.expect("span context");
                assert_eq!(ctx.trace_id, expected_trace);
                assert_eq!(ctx.parent_span_id, Some(expected_parent));
                Ok::<_, Unavailable>(HelloReply {
                    message: format!("hello {}", req.name),
                })
            })
            .await
            .unwrap();

        assert_eq!(reply.message, "hello ada");
    }

    #[tokio::test]
    async fn test_intercept_decorator_sees_call() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let decorator = TraceOption::span_decorator(move |_, method, req, resp, err| {
            let name = req.downcast_ref::<HelloRequest>().map(|r| r.name.clone());
            let message = resp
                .and_then(|r| r.downcast_ref::<HelloReply>())
                .map(|r| r.message.clone());
            let call = (method.to_string(), name, message, err.is_some());
            sink.lock().unwrap().push(call);
        });
        let interceptor = TracingInterceptor::server([decorator]);

        interceptor
            .intercept(None, "/svc/Hello", hello("bob"), |_, _| async {
                Ok::<_, Unavailable>(HelloReply {
                    message: "hi".to_string(),
                })
            })
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (method, name, message, failed) = &seen[0];
        assert_eq!(method, "/svc/Hello");
        assert_eq!(name.as_deref(), Some("bob"));
        assert_eq!(message.as_deref(), Some("hi"));
        assert!(!failed);
    }

    #[tokio::test]
    async fn test_intercept_error_reaches_decorator_and_caller() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        let decorator = TraceOption::span_decorator(move |_, _, _, resp, err| {
            assert!(resp.is_none());
            sink.lock().unwrap().push(err.map(|e| e.to_string()));
        });
        let interceptor = TracingInterceptor::client([decorator]);

        let result = interceptor
            .intercept(None, "/svc/Hello", hello("eve"), |_, _| async {
                Err::<HelloReply, _>(Unavailable)
            })
            .await;

        assert!(result.is_err());
        assert_eq!(
            *errors.lock().unwrap(),
            vec![Some("service unavailable".to_string())]
        );
    }

    #[tokio::test]
    async fn test_intercept_no_span_never_decorates() {
        let hits = Arc::new(AtomicUsize::new(0));
        let interceptor = TracingInterceptor::client([
            counting_decorator(hits.clone()),
            TraceOption::create_span(false),
        ]);
        let parent = SpanContext::new_root();
        let expected = parent.clone();

        interceptor
            .intercept(Some(parent), "/svc/Hello", hello("a"), |ctx, _| async move {
                assert_eq!(ctx, Some(expected));
                Ok::<_, Unavailable>(())
            })
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_intercept_excluded_never_decorates() {
        let hits = Arc::new(AtomicUsize::new(0));
        let interceptor = TracingInterceptor::server([
            counting_decorator(hits.clone()),
            TraceOption::including_spans(|_, _, _, _| false),
        ]);

        interceptor
            .intercept(None, "/svc/Hello", hello("a"), |ctx, _| async move {
                assert!(ctx.is_none());
                Ok::<_, Unavailable>(())
            })
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_intercept_concurrent_calls_share_settings() {
        let hits = Arc::new(AtomicUsize::new(0));
        let interceptor = TracingInterceptor::server([counting_decorator(hits.clone())]);

        let mut handles = Vec::new();
        for i in 0..8 {
            let interceptor = interceptor.clone();
            handles.push(tokio::spawn(async move {
                interceptor
                    .intercept(None, "/svc/Hello", i, |_, req| async move {
                        Ok::<_, Unavailable>(*req * 2)
                    })
                    .await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_interceptors_own_their_settings() {
        let options = vec![TraceOption::log_payloads(), skip_health_checks()];
        let client = TracingInterceptor::client(options.clone());
        let server = TracingInterceptor::server(options);

        assert!(!std::ptr::eq(client.settings(), server.settings()));
        assert!(client.settings().log_payloads());
        assert!(server.settings().log_payloads());

        let cloned = client.clone();
        assert!(std::ptr::eq(client.settings(), cloned.settings()));
    }

    #[test]
    fn test_whole_millis_saturates() {
        assert_eq!(whole_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(whole_millis(Duration::from_secs(u64::MAX)), u64::MAX);
    }

    #[test]
    fn test_span_kind_names() {
        assert_eq!(SpanKind::Client.as_str(), "client");
        assert_eq!(SpanKind::Server.to_string(), "server");
        assert_eq!(TracingInterceptor::server([]).kind(), SpanKind::Server);
    }
}
