use lifecycle_framework::tracing::init_tracing;
use lifecycle_framework::{capture_termination_signals, spawn_workload, BoxError};
use mailer::config::load_from_standard_locations;
use mailer::MailerSystem;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match load_from_standard_locations() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            eprintln!("Config not found or invalid. Create config.toml or set MAILER_CONFIG.");
            return ExitCode::FAILURE;
        }
    };

    let tracing_result = config
        .logging
        .tracing_options()
        .and_then(|options| init_tracing(&options));
    if let Err(e) = tracing_result {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    // Installed before any subsystem so an early Ctrl-C is buffered, not lost.
    let signals = match capture_termination_signals() {
        Ok(signals) => signals,
        Err(e) => {
            error!(error = %e, "Failed to install signal handlers");
            return ExitCode::FAILURE;
        }
    };

    let system = match MailerSystem::boot(Arc::clone(&config)).await {
        Ok(system) => system,
        Err(e) => {
            error!(
                subsystem = e.subsystem,
                constructed = ?e.constructed,
                error = %e,
                "Failed to start Mailer"
            );
            return ExitCode::FAILURE;
        }
    };

    let interface = system.interface(Handle::current());
    let completion = spawn_workload("mailer-cli", move || {
        interface.run().map_err(BoxError::from)
    })
    .unwrap_or_else(|e| {
        error!(error = %e, "Failed to start CLI interface");
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Err(BoxError::from(e)));
        rx
    });

    match system.run(signals, completion).await {
        Ok(reason) => {
            info!(?reason, "Mailer stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Error during shutdown");
            ExitCode::FAILURE
        }
    }
}
