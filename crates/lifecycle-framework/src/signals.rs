//! # Termination Signals
//!
//! SIGINT and SIGTERM are captured and treated identically. Capture happens when
//! [`capture_termination_signals`] is called, which should be before any subsystem
//! starts: the returned channel has room for one signal, so a signal that arrives before
//! anyone waits on it is buffered rather than lost.

use std::fmt::{self, Display};
use tokio::sync::mpsc;
use tracing::debug;

/// The OS notifications that end a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
}

impl Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationSignal::Interrupt => f.write_str("SIGINT"),
            TerminationSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Install the signal handlers and return the channel they feed.
///
/// Must be called from within a Tokio runtime. Registration errors are returned
/// immediately; once this succeeds, handlers stay installed for the life of the process.
#[cfg(unix)]
pub fn capture_termination_signals() -> std::io::Result<mpsc::Receiver<TerminationSignal>> {
    use tokio::signal::unix::{signal, SignalKind};

    let (tx, rx) = mpsc::channel(1);
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                Some(()) = interrupt.recv() => TerminationSignal::Interrupt,
                Some(()) = terminate.recv() => TerminationSignal::Terminate,
                else => break,
            };
            match tx.try_send(received) {
                Ok(()) => debug!(signal = %received, "Termination signal captured"),
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!(signal = %received, "Termination signal already pending")
                }
                Err(mpsc::error::TrySendError::Closed(_)) => break,
            }
        }
    });

    Ok(rx)
}

/// Install the Ctrl-C handler and return the channel it feeds.
#[cfg(not(unix))]
pub fn capture_termination_signals() -> std::io::Result<mpsc::Receiver<TerminationSignal>> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if let Err(mpsc::error::TrySendError::Closed(_)) =
                tx.try_send(TerminationSignal::Interrupt)
            {
                break;
            }
            debug!("Termination signal captured");
        }
    });
    Ok(rx)
}
