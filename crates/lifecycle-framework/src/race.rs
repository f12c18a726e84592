//! # Run Race
//!
//! Once a service is running, exactly two things can end it: a termination signal, or
//! the primary workload finishing on its own. [`RunRace`] waits for whichever comes
//! first and moves the lifecycle into `ShuttingDown` exactly once.
//!
//! ## Tie-break
//!
//! The select is `biased` toward the signal: if both inputs are ready at the same time,
//! the signal is reported. Either way the transition and the teardown that follows are
//! identical, so the tie-break only affects which reason gets logged.
//!
//! The losing input is dropped unread. Both channels have capacity, so the producer on
//! the losing side never blocks.

use crate::error::RuntimeError;
use crate::signals::TerminationSignal;
use crate::state::Lifecycle;
use crate::workload::WorkloadResult;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

/// Why the service began shutting down.
#[derive(Debug)]
pub enum ShutdownReason {
    Signal(TerminationSignal),
    WorkloadCompleted,
    WorkloadFailed(RuntimeError),
}

impl ShutdownReason {
    pub fn is_signal(&self) -> bool {
        matches!(self, ShutdownReason::Signal(_))
    }
}

/// The two shutdown triggers, injected so tests can drive either one.
pub struct RunRace {
    signals: mpsc::Receiver<TerminationSignal>,
    completion: oneshot::Receiver<WorkloadResult>,
}

impl RunRace {
    pub fn new(
        signals: mpsc::Receiver<TerminationSignal>,
        completion: oneshot::Receiver<WorkloadResult>,
    ) -> Self {
        Self {
            signals,
            completion,
        }
    }

    /// Block until one trigger fires, then enter `ShuttingDown`.
    ///
    /// If the signal source closes without delivering anything, the race keeps waiting on
    /// the workload alone.
    pub async fn wait(self, lifecycle: &Lifecycle) -> ShutdownReason {
        let RunRace {
            mut signals,
            completion,
        } = self;

        let reason = tokio::select! {
            biased;
            Some(signal) = signals.recv() => ShutdownReason::Signal(signal),
            finished = completion => match finished {
                Ok(Ok(())) => ShutdownReason::WorkloadCompleted,
                Ok(Err(e)) => ShutdownReason::WorkloadFailed(RuntimeError { source: e }),
                Err(_) => ShutdownReason::WorkloadFailed(RuntimeError::new(
                    "primary workload exited without reporting a result",
                )),
            },
        };

        match &reason {
            ShutdownReason::Signal(signal) => info!(%signal, "Shutdown signal received"),
            ShutdownReason::WorkloadCompleted => info!("Primary workload completed normally"),
            ShutdownReason::WorkloadFailed(e) => error!(error = %e, "Primary workload error"),
        }

        if !lifecycle.begin_shutdown() {
            warn!(state = %lifecycle.state(), "Shutdown already in progress");
        }

        reason
    }
}
