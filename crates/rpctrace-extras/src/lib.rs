//! # rpctrace-extras
//!
//! Optional add-ons for rpctrace, opt-in via Cargo feature flags.
//!
//! ## Features
//!
//! - `config` - Load tracing options from environment variables and `.env` files
//! - `logging` - Install a `tracing-subscriber` formatter with an env filter
//! - `full` - All features enabled
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! rpctrace-extras = { version = "0.1", features = ["config"] }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// Environment configuration module
#[cfg(feature = "config")]
pub mod config;

// Subscriber bootstrap
#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "config")]
pub use config::{load_dotenv, load_dotenv_from, ConfigError, TraceEnvConfig, ENV_PREFIX};

#[cfg(feature = "logging")]
pub use logging::{init_logging, LoggingError};
