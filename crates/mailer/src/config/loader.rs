//! Configuration loading from disk.

use crate::config::schema::MailerConfig;
use crate::config::validation::{validate_config, ValidationError};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "MAILER_CONFIG";

/// Searched in order when [`CONFIG_ENV`] is unset.
pub const STANDARD_LOCATIONS: [&str; 2] = ["config.toml", "config/config.toml"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no configuration file found (searched: {searched:?})")]
    NotFound { searched: Vec<PathBuf> },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load from `$MAILER_CONFIG`, or the first standard location that exists.
pub fn load_from_standard_locations() -> Result<MailerConfig, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return load_config(Path::new(&path));
    }

    let searched: Vec<PathBuf> = STANDARD_LOCATIONS.iter().map(PathBuf::from).collect();
    match searched.iter().find(|path| path.is_file()) {
        Some(path) => load_config(path),
        None => Err(ConfigError::NotFound { searched }),
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MailerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<MailerConfig, ConfigError> {
    let config: MailerConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.app.name, "Mailer");
        assert_eq!(config.database.url, "memory://mailer");
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.templates.suffix, ".html");
        assert_eq!(config.shutdown.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse_config(
            r#"
            [app]
            environment = "production"

            [smtp]
            host = "smtp.example.com"
            port = 2525
            username = "mailer"
            password = "hunter2"

            [shutdown]
            timeout_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.app.environment, "production");
        assert_eq!(config.app.name, "Mailer");
        assert_eq!(config.smtp.host, "smtp.example.com");
        assert_eq!(config.smtp.port, 2525);
        assert_eq!(config.smtp.pool_size, 4);
        assert_eq!(config.shutdown.timeout_secs, 10);
    }

    #[test]
    fn collects_every_validation_error() {
        let err = parse_config(
            r#"
            [processor]
            queue_capacity = 0

            [logging]
            format = "xml"

            [shutdown]
            timeout_secs = 0
            "#,
        )
        .unwrap_err();

        match err {
            ConfigError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert_eq!(
                    fields,
                    vec!["processor.queue_capacity", "logging.format", "shutdown.timeout_secs"]
                );
            }
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn huge_shutdown_timeout_does_not_panic_at_teardown() {
        let config = parse_config("[shutdown]\ntimeout_secs = 9223372036854775807").unwrap();

        let outcome = lifecycle_framework::ShutdownCoordinator::new(config.shutdown.timeout())
            .run(lifecycle_framework::TeardownPlan::new())
            .await;
        assert!(outcome.into_result().is_ok());
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            parse_config("[smtp\nhost = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[database]\nmax_connections = 3\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.database.max_connections, 3);

        let missing = load_config(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
