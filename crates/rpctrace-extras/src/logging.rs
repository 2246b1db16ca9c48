//! Subscriber bootstrap.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a `fmt`
//! layer, so the spans and events emitted by the interceptor are printed.

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info,rpctrace_core=debug";

/// Error installing the global subscriber
#[derive(Debug, Error)]
#[error("Failed to install tracing subscriber: {0}")]
pub struct LoggingError(#[from] tracing_subscriber::util::TryInitError);

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `default_filter` is used, or
/// [`DEFAULT_FILTER`] when that is `None`. Fails if a global subscriber is
/// already installed.
pub fn init_logging(default_filter: Option<&str>) -> Result<(), LoggingError> {
    let fallback = default_filter.unwrap_or(DEFAULT_FILTER);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    tracing::debug!(filter = fallback, "Logging initialized");
    Ok(())
}
