use lifecycle_framework::mock::{CallLog, MockSubsystem};
use lifecycle_framework::{
    LifecycleError, ShutdownCoordinator, StepStatus, TeardownPlan, DEFAULT_SHUTDOWN_TIMEOUT,
};
use std::sync::Arc;
use std::time::Duration;

const STEPS: [&str; 4] = [
    "stop processor",
    "close campaign coordinator",
    "close transport",
    "close store",
];

fn mocks(log: &CallLog) -> Vec<Arc<MockSubsystem>> {
    ["processor", "campaigns", "transport", "store"]
        .into_iter()
        .map(|name| Arc::new(MockSubsystem::new(name).with_log(log.clone())))
        .collect()
}

fn plan_with(subsystems: Vec<Option<Arc<MockSubsystem>>>) -> TeardownPlan {
    STEPS
        .into_iter()
        .zip(subsystems)
        .fold(TeardownPlan::new(), |plan, (name, subsystem)| {
            plan.step(name, subsystem)
        })
}

#[tokio::test]
async fn runs_every_step_in_plan_order() {
    let log = CallLog::new();
    let subsystems = mocks(&log);
    let plan = plan_with(subsystems.iter().cloned().map(Some).collect());

    let outcome = ShutdownCoordinator::default().run(plan).await;

    assert_eq!(
        log.entries(),
        vec!["stop processor", "stop campaigns", "stop transport", "stop store"]
    );
    assert_eq!(outcome.executed(), STEPS.to_vec());
    assert!(outcome.is_clean());
    assert!(subsystems.iter().all(|s| s.stop_calls() == 1));
    assert!(outcome.into_result().is_ok());
}

#[tokio::test]
async fn skips_exactly_the_missing_subsystems_for_every_subset() {
    for mask in 0u8..16 {
        let log = CallLog::new();
        let subsystems: Vec<_> = mocks(&log)
            .into_iter()
            .enumerate()
            .map(|(i, s)| (mask & (1 << i) != 0).then_some(s))
            .collect();

        let expected_run: Vec<&str> = (0..4)
            .filter(|i| mask & (1 << i) != 0)
            .map(|i| STEPS[i])
            .collect();
        let expected_skipped: Vec<&str> = (0..4)
            .filter(|i| mask & (1 << i) == 0)
            .map(|i| STEPS[i])
            .collect();

        let outcome = ShutdownCoordinator::default().run(plan_with(subsystems)).await;

        assert_eq!(outcome.executed(), expected_run, "mask {mask:04b}");
        assert_eq!(outcome.skipped(), expected_skipped, "mask {mask:04b}");
        assert_eq!(outcome.reports.len(), 4);
        assert_eq!(log.entries().len(), expected_run.len());
        assert!(outcome.errors.is_empty());
    }
}

#[tokio::test]
async fn a_failing_step_does_not_stop_the_rest() {
    for failing in 0..4 {
        let log = CallLog::new();
        let subsystems: Vec<_> = ["processor", "campaigns", "transport", "store"]
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let mock = MockSubsystem::new(name).with_log(log.clone());
                let mock = if i == failing {
                    mock.failing_stop("connection reset")
                } else {
                    mock
                };
                Some(Arc::new(mock))
            })
            .collect();

        let outcome = ShutdownCoordinator::default().run(plan_with(subsystems)).await;

        assert_eq!(log.entries().len(), 4);
        assert_eq!(outcome.executed(), STEPS.to_vec());
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].step, STEPS[failing]);
        assert_eq!(outcome.reports[failing].status, StepStatus::Failed);

        match outcome.into_result() {
            Err(LifecycleError::Shutdown(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected a shutdown error, got {other:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn missed_deadline_is_reported_without_waiting_for_slow_steps() {
    let log = CallLog::new();
    let processor = MockSubsystem::new("processor")
        .with_log(log.clone())
        .slow_stop(Duration::from_secs(20));
    let campaigns = MockSubsystem::new("campaigns")
        .with_log(log.clone())
        .slow_stop(Duration::from_secs(20));
    let transport = MockSubsystem::new("transport").with_log(log.clone());
    let store = MockSubsystem::new("store").with_log(log.clone());

    let plan = plan_with(vec![
        Some(Arc::new(processor)),
        Some(Arc::new(campaigns)),
        Some(Arc::new(transport)),
        Some(Arc::new(store)),
    ]);

    let started = tokio::time::Instant::now();
    let outcome = ShutdownCoordinator::new(DEFAULT_SHUTDOWN_TIMEOUT).run(plan).await;

    // The coordinator returns at the deadline, not after the 40s the steps need.
    let waited = started.elapsed();
    assert!(waited >= DEFAULT_SHUTDOWN_TIMEOUT);
    assert!(waited < DEFAULT_SHUTDOWN_TIMEOUT + Duration::from_secs(1));
    assert!(outcome.deadline_exceeded);
    assert_eq!(outcome.executed(), vec!["stop processor"]);
    assert_eq!(
        outcome.pending,
        vec!["close campaign coordinator", "close transport", "close store"]
    );

    match outcome.into_result() {
        Err(LifecycleError::Timeout(timeout)) => {
            assert_eq!(timeout.budget, DEFAULT_SHUTDOWN_TIMEOUT);
            assert_eq!(timeout.pending.len(), 3);
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn successful_but_slow_steps_still_time_out() {
    let plan = TeardownPlan::new()
        .step(
            "stop processor",
            Some(Arc::new(
                MockSubsystem::new("processor").slow_stop(Duration::from_secs(3)),
            )),
        )
        .step(
            "close store",
            Some(Arc::new(
                MockSubsystem::new("store").slow_stop(Duration::from_secs(3)),
            )),
        );

    let outcome = ShutdownCoordinator::new(Duration::from_secs(5)).run(plan).await;

    assert!(outcome.errors.is_empty());
    assert!(outcome.deadline_exceeded);
    assert_eq!(outcome.pending, vec!["close store"]);
}

#[tokio::test(start_paused = true)]
async fn late_steps_keep_running_after_the_deadline() {
    let log = CallLog::new();
    let store = Arc::new(MockSubsystem::new("store").with_log(log.clone()));
    let plan = TeardownPlan::new()
        .step(
            "stop processor",
            Some(Arc::new(
                MockSubsystem::new("processor")
                    .with_log(log.clone())
                    .slow_stop(Duration::from_secs(10)),
            )),
        )
        .step("close store", Some(store.clone()));

    let outcome = ShutdownCoordinator::new(Duration::from_secs(5)).run(plan).await;
    assert!(outcome.deadline_exceeded);
    assert_eq!(store.stop_calls(), 0);

    // Nothing was cancelled: the teardown task carries on in the background.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(log.entries(), vec!["stop processor", "stop store"]);
    assert_eq!(store.stop_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn cooperative_steps_give_up_at_the_deadline() {
    let processor = Arc::new(
        MockSubsystem::new("processor")
            .slow_stop(Duration::from_secs(60))
            .cooperative(),
    );
    let store = Arc::new(MockSubsystem::new("store"));
    let plan = TeardownPlan::new()
        .step("stop processor", Some(processor.clone()))
        .step("close store", Some(store.clone()));

    let _ = ShutdownCoordinator::new(Duration::from_secs(5)).run(plan).await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    // The processor returned at the deadline instead of sleeping for a minute, so the
    // store was closed right after it.
    assert_eq!(processor.stop_calls(), 1);
    assert_eq!(store.stop_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn unrepresentable_budget_still_runs_the_plan() {
    let log = CallLog::new();
    let plan = plan_with(mocks(&log).into_iter().map(Some).collect());

    let budget = Duration::from_secs(i64::MAX as u64);
    let outcome = ShutdownCoordinator::new(budget).run(plan).await;

    assert!(outcome.is_clean());
    assert_eq!(outcome.executed(), STEPS.to_vec());
    assert_eq!(outcome.budget, budget);
}
