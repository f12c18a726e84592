//! # Teardown Plan
//!
//! A teardown plan is a literal, ordered list of `(step name, subsystem)` pairs built
//! once by the application. The list is plain data: tests can inspect it, and the
//! [`ShutdownCoordinator`](crate::coordinator::ShutdownCoordinator) executes it without
//! knowing anything about the subsystems involved.
//!
//! A step whose subsystem was never constructed carries `None` and is skipped.

use crate::error::BoxError;
use crate::subsystem::Subsystem;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Upper bound on a representable shutdown deadline (roughly thirty years).
pub const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Deadline shared by every step of one shutdown attempt.
///
/// Steps receive it by reference and are expected to honour it cooperatively, e.g. by
/// racing their own drain against [`ShutdownContext::expired`].
#[derive(Debug, Clone)]
pub struct ShutdownContext {
    deadline: Instant,
    budget: Duration,
}

impl ShutdownContext {
    /// A context whose deadline is `budget` from now.
    ///
    /// A budget too large to represent is clamped to [`FAR_FUTURE`] from now.
    pub fn new(budget: Duration) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(budget)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        Self { deadline, budget }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Completes when the deadline elapses.
    pub async fn expired(&self) {
        tokio::time::sleep_until(self.deadline).await;
    }
}

/// One entry of a [`TeardownPlan`].
pub struct TeardownStep {
    name: &'static str,
    subsystem: Option<Arc<dyn Subsystem>>,
}

impl TeardownStep {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the step has a subsystem to stop.
    pub fn is_present(&self) -> bool {
        self.subsystem.is_some()
    }
}

/// How a single step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Skipped,
    Failed,
}

/// What happened to one step, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: &'static str,
    pub status: StepStatus,
    pub elapsed: Duration,
}

/// Sent from the teardown task to the coordinator after each step.
pub(crate) struct StepFinished {
    pub report: StepReport,
    pub error: Option<BoxError>,
}

/// Ordered list of teardown steps.
///
/// ```rust
/// use lifecycle_framework::mock::MockSubsystem;
/// use lifecycle_framework::TeardownPlan;
/// use std::sync::Arc;
///
/// let processor = Arc::new(MockSubsystem::new("processor"));
/// let plan = TeardownPlan::new()
///     .step("stop processor", Some(processor))
///     .step("close store", None::<Arc<MockSubsystem>>);
///
/// assert_eq!(plan.names(), vec!["stop processor", "close store"]);
/// ```
#[derive(Default)]
pub struct TeardownPlan {
    steps: Vec<TeardownStep>,
}

impl TeardownPlan {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step. `None` marks a subsystem that was never constructed.
    pub fn step<S: Subsystem>(mut self, name: &'static str, subsystem: Option<Arc<S>>) -> Self {
        self.steps.push(TeardownStep {
            name,
            subsystem: subsystem.map(|s| s as Arc<dyn Subsystem>),
        });
        self
    }

    pub fn steps(&self) -> &[TeardownStep] {
        &self.steps
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(TeardownStep::name).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order, reporting each one on `reports`.
    ///
    /// Each `stop` runs in its own task so a panicking subsystem becomes a failed step
    /// instead of ending the sequence.
    pub(crate) async fn execute(
        self,
        ctx: ShutdownContext,
        reports: mpsc::UnboundedSender<StepFinished>,
    ) {
        for TeardownStep { name, subsystem } in self.steps {
            let started = Instant::now();

            let Some(subsystem) = subsystem else {
                debug!(step = name, "Skipping teardown step, subsystem was never constructed");
                let report = StepReport {
                    step: name,
                    status: StepStatus::Skipped,
                    elapsed: Duration::ZERO,
                };
                let _ = reports.send(StepFinished {
                    report,
                    error: None,
                });
                continue;
            };

            info!(step = name, subsystem = subsystem.name(), "Running teardown step");
            let step_ctx = ctx.clone();
            let joined = tokio::spawn(async move { subsystem.stop(&step_ctx).await }).await;

            let error = match joined {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e),
                Err(join_error) => Some(BoxError::from(format!(
                    "teardown task aborted: {join_error}"
                ))),
            };
            let elapsed = started.elapsed();

            let status = match &error {
                None => {
                    debug!(step = name, ?elapsed, "Teardown step completed");
                    StepStatus::Completed
                }
                Some(e) => {
                    error!(step = name, error = %e, "Teardown step failed");
                    StepStatus::Failed
                }
            };

            let report = StepReport {
                step: name,
                status,
                elapsed,
            };
            // The coordinator may have stopped listening after its deadline; keep going.
            let _ = reports.send(StepFinished { report, error });
        }
    }
}
