//! # Shutdown Coordinator
//!
//! Executes a [`TeardownPlan`] under one overall deadline.
//!
//! ## Behaviour
//!
//! - Steps run strictly in plan order, one at a time.
//! - A failing step is logged and recorded; the next step still runs (fail-soft).
//! - A step without a subsystem is skipped.
//! - The deadline bounds how long the *coordinator* waits. When it elapses the coordinator
//!   stops collecting reports and returns with `deadline_exceeded` set. The teardown task
//!   itself is left running: a step that ignores its [`ShutdownContext`] is never
//!   forcibly cancelled, it is only reported late.
//!
//! ```text
//! coordinator ──spawn──▶ teardown task: step 1 ─▶ step 2 ─▶ step 3 ─▶ step 4
//!      ▲                                  │         │         │         │
//!      └───────────── StepFinished ───────┴─────────┴─────────┴─────────┘
//!      (stops listening at the deadline)
//! ```

use crate::error::{LifecycleError, ShutdownStepError, TimeoutError};
use crate::teardown::{ShutdownContext, StepFinished, StepReport, StepStatus, TeardownPlan};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Default overall shutdown budget.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Aggregate result of one shutdown attempt.
#[derive(Debug, Default)]
pub struct ShutdownOutcome {
    /// Reports for every step that finished before the deadline, in order.
    pub reports: Vec<StepReport>,
    /// One entry per failed step.
    pub errors: Vec<ShutdownStepError>,
    pub deadline_exceeded: bool,
    /// Steps that had not reported back when the deadline elapsed.
    pub pending: Vec<&'static str>,
    pub budget: Duration,
}

impl ShutdownOutcome {
    fn record(&mut self, finished: StepFinished) {
        let StepFinished { report, error } = finished;
        if let Some(source) = error {
            self.errors.push(ShutdownStepError {
                step: report.step,
                source,
            });
        }
        self.reports.push(report);
    }

    /// True when every step finished in time without error.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && !self.deadline_exceeded
    }

    /// Steps that actually ran (completed or failed), in order.
    pub fn executed(&self) -> Vec<&'static str> {
        self.reports
            .iter()
            .filter(|r| r.status != StepStatus::Skipped)
            .map(|r| r.step)
            .collect()
    }

    pub fn skipped(&self) -> Vec<&'static str> {
        self.reports
            .iter()
            .filter(|r| r.status == StepStatus::Skipped)
            .map(|r| r.step)
            .collect()
    }

    /// Collapse the outcome into the error the caller should act on.
    ///
    /// A missed deadline wins over individual step failures.
    pub fn into_result(self) -> Result<(), LifecycleError> {
        if self.deadline_exceeded {
            return Err(TimeoutError {
                budget: self.budget,
                pending: self.pending,
            }
            .into());
        }
        if !self.errors.is_empty() {
            return Err(LifecycleError::Shutdown(self.errors));
        }
        Ok(())
    }
}

/// Runs teardown plans under a fixed budget.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute `plan`. The deadline starts now.
    pub async fn run(&self, plan: TeardownPlan) -> ShutdownOutcome {
        let ctx = ShutdownContext::new(self.timeout);
        let names = plan.names();
        info!(timeout = ?self.timeout, steps = names.len(), "Starting graceful shutdown");

        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(plan.execute(ctx.clone(), tx));

        let mut outcome = ShutdownOutcome {
            budget: self.timeout,
            ..ShutdownOutcome::default()
        };

        loop {
            match tokio::time::timeout_at(ctx.deadline(), rx.recv()).await {
                Ok(Some(finished)) => outcome.record(finished),
                Ok(None) => break,
                Err(_) => {
                    outcome.deadline_exceeded = outcome.reports.len() < names.len();
                    break;
                }
            }
        }

        // Reports arrive in plan order, so whatever is missing is the tail.
        outcome.pending = names[outcome.reports.len()..].to_vec();
        if !outcome.pending.is_empty() && !outcome.deadline_exceeded {
            // Channel closed early: the teardown task itself died.
            warn!(pending = ?outcome.pending, "Teardown task ended before finishing its plan");
        }
        if ctx.is_expired() && !outcome.pending.is_empty() {
            outcome.deadline_exceeded = true;
        }

        if outcome.deadline_exceeded {
            error!(
                timeout = ?self.timeout,
                pending = ?outcome.pending,
                "Shutdown deadline exceeded"
            );
        } else if outcome.errors.is_empty() {
            info!("Graceful shutdown completed");
        } else {
            warn!(failed = outcome.errors.len(), "Graceful shutdown completed with errors");
        }

        outcome
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_SHUTDOWN_TIMEOUT)
    }
}
