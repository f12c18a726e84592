//! # Subsystem Trait
//!
//! The contract every independently owned part of a service satisfies so the
//! orchestrator can start and stop it without knowing what it does.
//!
//! Construction is *not* part of the trait: each subsystem has its own fallible
//! constructor taking exactly the dependencies it needs, and the dependency chain calls
//! them in order. The trait only covers what happens after construction.

use crate::error::BoxError;
use crate::teardown::ShutdownContext;
use async_trait::async_trait;

/// Lifecycle hooks of a long-running subsystem.
///
/// # Contract
/// - [`start`](Subsystem::start) is optional; the default does nothing.
/// - [`stop`](Subsystem::stop) releases the subsystem's resources. It is called at most
///   once by the orchestrator; implementations return an error (never panic) if it is
///   called again.
/// - `stop` receives the shared [`ShutdownContext`] and should wind down promptly once
///   [`ShutdownContext::is_expired`] reports true. Nothing forces it to.
#[async_trait]
pub trait Subsystem: Send + Sync + 'static {
    /// Short name used in logs and errors (e.g. `"store"`).
    fn name(&self) -> &'static str;

    async fn start(&self) -> Result<(), BoxError> {
        Ok(())
    }

    async fn stop(&self, ctx: &ShutdownContext) -> Result<(), BoxError>;
}
