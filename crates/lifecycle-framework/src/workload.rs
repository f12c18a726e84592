//! # Primary Workload
//!
//! The primary workload is the part of the service that decides, on its own, when the
//! service is done (an interactive command surface, a batch job). It usually blocks on
//! I/O, so it gets a dedicated OS thread instead of a Tokio worker.
//!
//! Its completion is delivered through a `oneshot` channel, so the thread never blocks on
//! reporting even if nobody is listening anymore.

use crate::error::BoxError;
use tokio::sync::oneshot;
use tracing::debug;

/// Result reported by the primary workload.
pub type WorkloadResult = Result<(), BoxError>;

/// Run `work` on a new named thread and return its completion channel.
///
/// The thread is detached. If shutdown is triggered by something else, the thread is
/// simply never joined; it ends with the process.
pub fn spawn_workload<F>(
    name: &str,
    work: F,
) -> std::io::Result<oneshot::Receiver<WorkloadResult>>
where
    F: FnOnce() -> WorkloadResult + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let thread_name = name.to_string();

    std::thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || {
            debug!(workload = %thread_name, "Primary workload started");
            let result = work();
            if tx.send(result).is_err() {
                debug!(workload = %thread_name, "Primary workload finished after shutdown began");
            }
        })?;

    Ok(rx)
}
