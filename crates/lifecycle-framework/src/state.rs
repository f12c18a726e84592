//! # Lifecycle State Machine
//!
//! A service moves through four states, always forwards and one step at a time:
//!
//! ```text
//! NotStarted ──▶ Running ──▶ ShuttingDown ──▶ Stopped
//! ```
//!
//! The current state lives in a `tokio::sync::watch` channel. Any subsystem can
//! [`subscribe`](Lifecycle::subscribe) and await changes; because the sender only ever
//! accepts the immediate successor, no observer can see a transition backwards.

use crate::error::TransitionError;
use std::fmt::{self, Display};
use tokio::sync::watch;
use tracing::{debug, warn};

/// The four lifecycle states of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    NotStarted,
    Running,
    ShuttingDown,
    Stopped,
}

impl LifecycleState {
    /// The only state this one may move to.
    pub fn successor(self) -> Option<LifecycleState> {
        match self {
            LifecycleState::NotStarted => Some(LifecycleState::Running),
            LifecycleState::Running => Some(LifecycleState::ShuttingDown),
            LifecycleState::ShuttingDown => Some(LifecycleState::Stopped),
            LifecycleState::Stopped => None,
        }
    }
}

impl Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LifecycleState::NotStarted => "not-started",
            LifecycleState::Running => "running",
            LifecycleState::ShuttingDown => "shutting-down",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

/// Owner of the service's lifecycle state.
///
/// Only the orchestrator holds a `Lifecycle`; everything else gets a
/// [`watch::Receiver`] from [`Lifecycle::subscribe`].
#[derive(Debug)]
pub struct Lifecycle {
    tx: watch::Sender<LifecycleState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(LifecycleState::NotStarted);
        Self { tx }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    /// Move to `next`, which must be the immediate successor of the current state.
    pub fn advance(&self, next: LifecycleState) -> Result<(), TransitionError> {
        let mut rejected = None;
        self.tx.send_if_modified(|current| {
            if current.successor() == Some(next) {
                *current = next;
                true
            } else {
                rejected = Some(*current);
                false
            }
        });

        match rejected {
            None => {
                debug!(state = %next, "Lifecycle transition");
                Ok(())
            }
            Some(from) => {
                warn!(%from, to = %next, "Rejected lifecycle transition");
                Err(TransitionError { from, to: next })
            }
        }
    }

    /// Enter `ShuttingDown`. Returns `true` only for the call that performed the transition.
    pub fn begin_shutdown(&self) -> bool {
        self.advance(LifecycleState::ShuttingDown).is_ok()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_forward_through_every_state() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::NotStarted);

        lifecycle.advance(LifecycleState::Running).unwrap();
        lifecycle.advance(LifecycleState::ShuttingDown).unwrap();
        lifecycle.advance(LifecycleState::Stopped).unwrap();

        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    }

    #[test]
    fn rejects_skipping_and_backward_moves() {
        let lifecycle = Lifecycle::new();

        let err = lifecycle.advance(LifecycleState::ShuttingDown).unwrap_err();
        assert_eq!(err.from, LifecycleState::NotStarted);
        assert_eq!(lifecycle.state(), LifecycleState::NotStarted);

        lifecycle.advance(LifecycleState::Running).unwrap();
        assert!(lifecycle.advance(LifecycleState::NotStarted).is_err());
        assert_eq!(lifecycle.state(), LifecycleState::Running);
    }

    #[test]
    fn shutdown_begins_exactly_once() {
        let lifecycle = Lifecycle::new();
        lifecycle.advance(LifecycleState::Running).unwrap();

        assert!(lifecycle.begin_shutdown());
        assert!(!lifecycle.begin_shutdown());
        assert_eq!(lifecycle.state(), LifecycleState::ShuttingDown);
    }

    #[tokio::test]
    async fn subscribers_see_forward_transitions() {
        let lifecycle = Lifecycle::new();
        let mut rx = lifecycle.subscribe();

        lifecycle.advance(LifecycleState::Running).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), LifecycleState::Running);

        lifecycle.begin_shutdown();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), LifecycleState::ShuttingDown);
    }
}
