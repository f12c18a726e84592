//! # Lifecycle Errors
//!
//! Every phase of a service's life has its own failure type, and the types never cross
//! phases: a startup failure is never handled by teardown logic and a teardown failure
//! never loops back into startup.
//!
//! | Type | Phase | Effect |
//! |------|-------|--------|
//! | [`InitializationError`] | startup | fatal, nothing is torn down |
//! | [`RuntimeError`] | running | logged, triggers shutdown |
//! | [`ShutdownStepError`] | teardown | logged and recorded, remaining steps still run |
//! | [`TimeoutError`] | teardown | the whole shutdown attempt failed |
//!
//! Subsystems report their own failures as [`BoxError`], the same way entity errors are
//! boxed when they cross into the framework.

use crate::state::LifecycleState;
use std::time::Duration;

/// Boxed error returned by subsystem hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A dependency-chain step failed to construct or start its subsystem.
#[derive(Debug, thiserror::Error)]
#[error("failed to initialize {subsystem}: {source}")]
pub struct InitializationError {
    /// The subsystem whose constructor (or `start`) failed.
    pub subsystem: &'static str,
    /// Subsystems that had already been constructed when the failure happened.
    pub constructed: Vec<&'static str>,
    #[source]
    pub source: BoxError,
}

impl InitializationError {
    pub fn new(
        subsystem: &'static str,
        constructed: Vec<&'static str>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            subsystem,
            constructed,
            source: source.into(),
        }
    }
}

/// The primary workload finished with an error.
#[derive(Debug, thiserror::Error)]
#[error("primary workload failed: {source}")]
pub struct RuntimeError {
    #[source]
    pub source: BoxError,
}

impl RuntimeError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// One teardown step failed.
#[derive(Debug, thiserror::Error)]
#[error("shutdown step '{step}' failed: {source}")]
pub struct ShutdownStepError {
    pub step: &'static str,
    #[source]
    pub source: BoxError,
}

/// The shutdown deadline elapsed before the coordinator saw every step finish.
#[derive(Debug, thiserror::Error)]
#[error("shutdown did not finish within {budget:?} (pending: {pending:?})")]
pub struct TimeoutError {
    pub budget: Duration,
    /// Steps that had not reported back when the deadline elapsed.
    pub pending: Vec<&'static str>,
}

/// A lifecycle transition that would move backwards or skip a state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid lifecycle transition from {from} to {to}")]
pub struct TransitionError {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

/// Umbrella error for everything the orchestrator can report.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Initialization(#[from] InitializationError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("{} shutdown step(s) failed", .0.len())]
    Shutdown(Vec<ShutdownStepError>),
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}
