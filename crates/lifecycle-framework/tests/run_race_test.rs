use lifecycle_framework::mock::{CallLog, MockSubsystem};
use lifecycle_framework::{
    Lifecycle, LifecycleState, RunRace, ShutdownCoordinator, ShutdownReason, TeardownPlan,
    TerminationSignal, WorkloadResult,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

fn running() -> Lifecycle {
    let lifecycle = Lifecycle::new();
    lifecycle.advance(LifecycleState::Running).unwrap();
    lifecycle
}

fn channels() -> (
    mpsc::Sender<TerminationSignal>,
    mpsc::Receiver<TerminationSignal>,
    oneshot::Sender<WorkloadResult>,
    oneshot::Receiver<WorkloadResult>,
) {
    let (signal_tx, signal_rx) = mpsc::channel(1);
    let (done_tx, done_rx) = oneshot::channel();
    (signal_tx, signal_rx, done_tx, done_rx)
}

/// Race, then tear down, counting transitions and teardown runs.
async fn race_then_teardown(
    lifecycle: &Lifecycle,
    race: RunRace,
    log: &CallLog,
) -> ShutdownReason {
    let mut states = lifecycle.subscribe();
    let reason = race.wait(lifecycle).await;

    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), LifecycleState::ShuttingDown);

    let plan = TeardownPlan::new()
        .step(
            "stop processor",
            Some(Arc::new(MockSubsystem::new("processor").with_log(log.clone()))),
        )
        .step(
            "close store",
            Some(Arc::new(MockSubsystem::new("store").with_log(log.clone()))),
        );
    let outcome = ShutdownCoordinator::default().run(plan).await;
    assert!(outcome.is_clean());
    lifecycle.advance(LifecycleState::Stopped).unwrap();

    reason
}

#[tokio::test]
async fn signal_first_shuts_down_once() {
    let lifecycle = running();
    let log = CallLog::new();
    let (signal_tx, signals, done_tx, done) = channels();

    signal_tx.try_send(TerminationSignal::Terminate).unwrap();
    let reason = race_then_teardown(&lifecycle, RunRace::new(signals, done), &log).await;

    assert!(matches!(reason, ShutdownReason::Signal(TerminationSignal::Terminate)));
    assert_eq!(log.entries(), vec!["stop processor", "stop store"]);

    // The workload finishing later is never read and never blocks.
    assert!(done_tx.send(Ok(())).is_err());
    assert!(!lifecycle.begin_shutdown());
}

#[tokio::test]
async fn workload_first_shuts_down_once() {
    let lifecycle = running();
    let log = CallLog::new();
    let (signal_tx, signals, done_tx, done) = channels();

    done_tx.send(Ok(())).unwrap();
    let reason = race_then_teardown(&lifecycle, RunRace::new(signals, done), &log).await;

    assert!(matches!(reason, ShutdownReason::WorkloadCompleted));
    assert_eq!(log.entries(), vec!["stop processor", "stop store"]);
    assert!(signal_tx.try_send(TerminationSignal::Interrupt).is_err());
}

#[tokio::test]
async fn signal_wins_a_tie() {
    let lifecycle = running();
    let (signal_tx, signals, done_tx, done) = channels();

    done_tx.send(Ok(())).unwrap();
    signal_tx.try_send(TerminationSignal::Interrupt).unwrap();

    let reason = RunRace::new(signals, done).wait(&lifecycle).await;
    assert!(matches!(reason, ShutdownReason::Signal(TerminationSignal::Interrupt)));
    assert_eq!(lifecycle.state(), LifecycleState::ShuttingDown);
}

#[tokio::test]
async fn workload_error_does_not_change_teardown() {
    let lifecycle = running();
    let log = CallLog::new();
    let (_signal_tx, signals, done_tx, done) = channels();

    done_tx.send(Err("stdin: broken pipe".into())).unwrap();
    let reason = race_then_teardown(&lifecycle, RunRace::new(signals, done), &log).await;

    match reason {
        ShutdownReason::WorkloadFailed(e) => assert!(e.to_string().contains("broken pipe")),
        other => panic!("expected workload failure, got {other:?}"),
    }
    assert_eq!(log.entries(), vec!["stop processor", "stop store"]);
}

#[tokio::test]
async fn vanished_workload_counts_as_failure() {
    let lifecycle = running();
    let (_signal_tx, signals, done_tx, done) = channels();

    drop(done_tx);
    let reason = RunRace::new(signals, done).wait(&lifecycle).await;

    assert!(matches!(reason, ShutdownReason::WorkloadFailed(_)));
    assert_eq!(lifecycle.state(), LifecycleState::ShuttingDown);
}

#[tokio::test]
async fn closed_signal_source_falls_back_to_the_workload() {
    let lifecycle = running();
    let (signal_tx, signals, done_tx, done) = channels();

    drop(signal_tx);
    tokio::spawn(async move {
        tokio::task::yield_now().await;
        let _ = done_tx.send(Ok(()));
    });

    let reason = RunRace::new(signals, done).wait(&lifecycle).await;
    assert!(matches!(reason, ShutdownReason::WorkloadCompleted));
}
