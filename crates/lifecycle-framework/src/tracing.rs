//! # Observability & Tracing
//!
//! [`init_tracing`] installs the process-wide `tracing` subscriber.
//!
//! - **Filtering**: `RUST_LOG` wins when set; otherwise the configured level is used
//!   (e.g. `"info"` or `"mailer=debug,lifecycle_framework=info"`).
//! - **Format**: compact (default), pretty, or JSON lines.
//! - **Targets** are hidden; every event carries a `subsystem` or `step` field instead.
//!
//! ```bash
//! RUST_LOG=debug cargo run -p mailer
//! ```
//!
//! Orchestration events look like this in compact form:
//!
//! ```text
//! INFO Starting Mailer version="2.0.0" environment="production"
//! INFO Mailer ready
//! INFO Shutdown signal received signal=SIGTERM
//! INFO Starting graceful shutdown timeout=30s steps=4
//! INFO Running teardown step step="stop processor" subsystem="processor"
//! ERROR Teardown step failed step="close transport" error=transport already closed
//! WARN Graceful shutdown completed with errors failed=1
//! ```

use crate::error::BoxError;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Output format of the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(TracingError::UnknownFormat(other.to_string())),
        }
    }
}

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct TracingOptions {
    /// Default filter directive, used when `RUST_LOG` is not set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("unknown log format: {0}")]
    UnknownFormat(String),
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("failed to install tracing subscriber: {0}")]
    Install(BoxError),
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(options: &TracingOptions) -> Result<(), TracingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&options.level)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match options.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| TracingError::Install(e.into()))
}
