//! Semantic configuration validation.

use crate::config::schema::MailerConfig;
use std::fmt;

/// One rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every section, collecting all problems instead of stopping at the first.
pub fn validate_config(config: &MailerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.database.queue_depth == 0 {
        errors.push(ValidationError::new("database.queue_depth", "must be greater than 0"));
    }
    if config.smtp.pool_size == 0 {
        errors.push(ValidationError::new("smtp.pool_size", "must be greater than 0"));
    }
    if config.processor.queue_capacity == 0 {
        errors.push(ValidationError::new(
            "processor.queue_capacity",
            "must be greater than 0",
        ));
    }
    if let Err(e) = config.logging.tracing_options() {
        errors.push(ValidationError::new("logging.format", e.to_string()));
    }
    if config.templates.suffix.is_empty() {
        errors.push(ValidationError::new("templates.suffix", "must not be empty"));
    }
    if config.shutdown.timeout_secs == 0 {
        errors.push(ValidationError::new("shutdown.timeout_secs", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
