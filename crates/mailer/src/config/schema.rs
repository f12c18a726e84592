//! Configuration schema.

use lifecycle_framework::tracing::{TracingError, TracingOptions};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration, grouped by subsystem.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MailerConfig {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub smtp: SmtpConfig,
    pub processor: ProcessorConfig,
    pub logging: LoggingConfig,
    pub templates: TemplatesConfig,
    pub shutdown: ShutdownConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    /// Free-form deployment label, only ever logged.
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Mailer".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Store connection parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Capacity of the store's request queue.
    pub queue_depth: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "memory://mailer".to_string(),
            max_connections: 10,
            queue_depth: 64,
        }
    }
}

/// Outbound transport parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub pool_size: usize,
    pub use_tls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            username: None,
            password: None,
            from_address: "noreply@localhost".to_string(),
            pool_size: 4,
            use_tls: true,
        }
    }
}

/// Processor tuning parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub queue_capacity: usize,
    /// How long `submit` waits for queue space before giving up.
    pub enqueue_timeout_secs: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            enqueue_timeout_secs: 5,
        }
    }
}

impl ProcessorConfig {
    pub fn enqueue_timeout(&self) -> Duration {
        Duration::from_secs(self.enqueue_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// `compact`, `pretty` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn tracing_options(&self) -> Result<TracingOptions, TracingError> {
        Ok(TracingOptions {
            level: self.level.clone(),
            format: self.format.parse()?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub dir: PathBuf,
    /// Only files ending in this suffix are loaded; the suffix is stripped for the name.
    pub suffix: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("templates"),
            suffix: ".html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    pub timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl ShutdownConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
