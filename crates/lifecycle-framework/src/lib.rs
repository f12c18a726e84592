//! # Lifecycle Framework
//!
//! Building blocks for the startup/shutdown orchestration of a long-running service made
//! of independently owned subsystems.
//!
//! The framework knows nothing about what the subsystems do. It supplies:
//!
//! 1. **Contract** ([`Subsystem`]) - `start`/`stop` hooks every subsystem implements.
//! 2. **State** ([`Lifecycle`]) - a forward-only `NotStarted → Running → ShuttingDown →
//!    Stopped` state machine observers can subscribe to.
//! 3. **Triggers** ([`capture_termination_signals`], [`spawn_workload`], [`RunRace`]) -
//!    the two events that can end a running service and the race between them.
//! 4. **Teardown** ([`TeardownPlan`], [`ShutdownCoordinator`]) - an ordered, fail-soft
//!    teardown under one deadline.
//!
//! ## Startup vs. Shutdown
//!
//! | | Startup | Shutdown |
//! |---|---|---|
//! | Order | dependency order | reverse dependency order |
//! | On failure | abort (fail-fast) | log, record, continue (fail-soft) |
//! | Error | [`InitializationError`] | [`ShutdownStepError`], [`TimeoutError`] |
//!
//! Construction of subsystems is application code (each constructor takes the
//! dependencies it needs), so the framework provides the error type for it but no
//! builder.
//!
//! ## Typical flow
//!
//! ```rust
//! use lifecycle_framework::mock::MockSubsystem;
//! use lifecycle_framework::{
//!     Lifecycle, LifecycleState, RunRace, ShutdownCoordinator, TeardownPlan,
//! };
//! use std::sync::Arc;
//! use tokio::sync::{mpsc, oneshot};
//!
//! #[tokio::main]
//! async fn main() {
//!     let lifecycle = Lifecycle::new();
//!     let (_signal_tx, signals) = mpsc::channel(1);
//!     let (done_tx, done) = oneshot::channel();
//!
//!     let store = Arc::new(MockSubsystem::new("store"));
//!     lifecycle.advance(LifecycleState::Running).unwrap();
//!
//!     // The primary workload finishes on its own.
//!     done_tx.send(Ok(())).unwrap();
//!     let reason = RunRace::new(signals, done).wait(&lifecycle).await;
//!     assert!(!reason.is_signal());
//!
//!     let plan = TeardownPlan::new().step("close store", Some(store));
//!     let outcome = ShutdownCoordinator::default().run(plan).await;
//!     assert!(outcome.into_result().is_ok());
//! }
//! ```
//!
//! ## Testing
//!
//! See the [`mock`] module for [`MockSubsystem`](mock::MockSubsystem) and
//! [`CallLog`](mock::CallLog).

pub mod coordinator;
pub mod error;
pub mod mock;
pub mod race;
pub mod signals;
pub mod state;
pub mod subsystem;
pub mod teardown;
pub mod tracing;
pub mod workload;

pub use coordinator::{ShutdownCoordinator, ShutdownOutcome, DEFAULT_SHUTDOWN_TIMEOUT};
pub use error::{
    BoxError, InitializationError, LifecycleError, RuntimeError, ShutdownStepError,
    TimeoutError, TransitionError,
};
pub use race::{RunRace, ShutdownReason};
pub use signals::{capture_termination_signals, TerminationSignal};
pub use state::{Lifecycle, LifecycleState};
pub use subsystem::Subsystem;
pub use teardown::{ShutdownContext, StepReport, StepStatus, TeardownPlan, TeardownStep};
pub use workload::{spawn_workload, WorkloadResult};
