//! # Mock Subsystems
//!
//! [`MockSubsystem`] implements [`Subsystem`] entirely in memory so orchestration logic
//! can be tested without real stores or connections. Several mocks can share one
//! [`CallLog`] to assert the *order* in which an orchestrator touched them.
//!
//! ```rust
//! use lifecycle_framework::mock::{CallLog, MockSubsystem};
//! use lifecycle_framework::{ShutdownCoordinator, TeardownPlan};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let log = CallLog::new();
//!     let processor = Arc::new(MockSubsystem::new("processor").with_log(log.clone()));
//!     let store = Arc::new(
//!         MockSubsystem::new("store")
//!             .with_log(log.clone())
//!             .failing_stop("disk detached"),
//!     );
//!
//!     let plan = TeardownPlan::new()
//!         .step("stop processor", Some(processor))
//!         .step("close store", Some(store));
//!     let outcome = ShutdownCoordinator::default().run(plan).await;
//!
//!     assert_eq!(log.entries(), vec!["stop processor", "stop store"]);
//!     assert_eq!(outcome.errors.len(), 1);
//! }
//! ```
//!
//! ## Failure injection
//!
//! | Builder | Effect |
//! |---------|--------|
//! | [`failing_start`](MockSubsystem::failing_start) | `start` returns an error |
//! | [`failing_stop`](MockSubsystem::failing_stop) | `stop` returns an error |
//! | [`slow_stop`](MockSubsystem::slow_stop) | `stop` sleeps before returning |
//! | [`cooperative`](MockSubsystem::cooperative) | a slow `stop` gives up at the deadline |

use crate::error::BoxError;
use crate::subsystem::Subsystem;
use crate::teardown::ShutdownContext;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Shared, ordered record of lifecycle calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// An in-memory [`Subsystem`] with configurable failures and delays.
#[derive(Debug)]
pub struct MockSubsystem {
    name: &'static str,
    log: CallLog,
    start_error: Option<String>,
    stop_error: Option<String>,
    stop_delay: Duration,
    cooperative: bool,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl MockSubsystem {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            log: CallLog::new(),
            start_error: None,
            stop_error: None,
            stop_delay: Duration::ZERO,
            cooperative: false,
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    pub fn failing_start(mut self, message: impl Into<String>) -> Self {
        self.start_error = Some(message.into());
        self
    }

    pub fn failing_stop(mut self, message: impl Into<String>) -> Self {
        self.stop_error = Some(message.into());
        self
    }

    pub fn slow_stop(mut self, delay: Duration) -> Self {
        self.stop_delay = delay;
        self
    }

    pub fn cooperative(mut self) -> Self {
        self.cooperative = true;
        self
    }

    pub fn start_calls(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Subsystem for MockSubsystem {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn start(&self) -> Result<(), BoxError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.log.record(format!("start {}", self.name));
        match &self.start_error {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }

    async fn stop(&self, ctx: &ShutdownContext) -> Result<(), BoxError> {
        if self.stops.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(format!("{} already stopped", self.name).into());
        }
        self.log.record(format!("stop {}", self.name));

        if !self.stop_delay.is_zero() {
            if self.cooperative {
                tokio::select! {
                    _ = tokio::time::sleep(self.stop_delay) => {}
                    _ = ctx.expired() => {}
                }
            } else {
                tokio::time::sleep(self.stop_delay).await;
            }
        }

        match &self.stop_error {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }
}
