//! Tracing options from environment variables.
//!
//! Scalar settings can be supplied by the deployment instead of code.
//! Variables use the `RPCTRACE_` prefix:
//!
//! | variable                 | option                         | default |
//! |--------------------------|--------------------------------|---------|
//! | `RPCTRACE_LOG_PAYLOADS`  | [`TraceOption::log_payloads`]  | `false` |
//! | `RPCTRACE_CREATE_SPAN`   | [`TraceOption::create_span`]   | `true`  |
//!
//! Predicates and decorators are code, so they are never read from the
//! environment.
//!
//! # Example
//!
//! ```ignore
//! use rpctrace_core::{TraceOption, TracingInterceptor};
//! use rpctrace_extras::config::{load_dotenv, TraceEnvConfig};
//!
//! load_dotenv()?;
//!
//! let mut options = TraceEnvConfig::from_env()?.into_options();
//! options.push(TraceOption::including_spans(|_, method, _, _| method != "/Health"));
//!
//! let interceptor = TracingInterceptor::server(options);
//! ```

use rpctrace_core::TraceOption;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Prefix of every environment variable read by [`TraceEnvConfig`]
pub const ENV_PREFIX: &str = "RPCTRACE_";

/// Error type for configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable deserialization failed.
    #[error("Configuration error: {0}")]
    Env(#[from] envy::Error),
    /// A `.env` file exists but could not be read or parsed.
    #[error("Failed to load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

/// Result alias for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load `.env` from the current directory or its parents.
///
/// A missing file is not an error.
pub fn load_dotenv() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "Loaded .env file");
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Load a specific `.env` file. A missing file is not an error.
pub fn load_dotenv_from(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match dotenvy::from_path(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Loaded .env file");
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Scalar tracing settings read from `RPCTRACE_*` variables
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TraceEnvConfig {
    /// Maps to `RPCTRACE_LOG_PAYLOADS`
    pub log_payloads: bool,
    /// Maps to `RPCTRACE_CREATE_SPAN`
    pub create_span: bool,
}

impl Default for TraceEnvConfig {
    fn default() -> Self {
        Self {
            log_payloads: false,
            create_span: true,
        }
    }
}

impl TraceEnvConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self> {
        let config = envy::prefixed(ENV_PREFIX).from_env::<Self>()?;
        tracing::debug!(
            log_payloads = config.log_payloads,
            create_span = config.create_span,
            "Tracing configuration loaded from environment"
        );
        Ok(config)
    }

    /// Read from explicit `(name, value)` pairs, using the same prefix rules
    /// as [`from_env`](Self::from_env).
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter(vars)?)
    }

    /// Convert to options that reproduce these settings.
    ///
    /// Options appended after these override them, so code keeps the last
    /// word over the environment.
    pub fn into_options(self) -> Vec<TraceOption> {
        let mut options = Vec::with_capacity(2);
        if self.log_payloads {
            options.push(TraceOption::log_payloads());
        }
        options.push(TraceOption::create_span(self.create_span));
        options
    }
}
