// tests/integration_cancel_behaviour.rs

//! Cancellation behaviour: an in-flight run is killed, reported as
//! cancelled, and leaves no process behind.

use std::error::Error;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Duration};

use serverun::engine::{CoreTask, Runtime, TaskEvent, TaskOutcome};
use serverun::exec::{CommandExecutor, CommandInvocation, RealCommandExecutor};
use serverun_test_utils::builders::TaskOptionsBuilder;
use serverun_test_utils::fake_executor::{FakeCommandExecutor, FakeRun};
use serverun_test_utils::fake_host::FakeHost;
use serverun_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn cancel_kills_the_inflight_run_and_reports_cancelled() -> TestResult {
    init_tracing();

    let options = TaskOptionsBuilder::new("npm run e2e")
        .service("npm run dev")
        .watch(true)
        .build();

    let host = Arc::new(FakeHost::new());
    let (event_tx, event_rx) = mpsc::channel::<TaskEvent>(16);
    let (outcome_tx, _outcome_rx) = mpsc::channel::<TaskOutcome>(16);
    let executor = FakeCommandExecutor::new(event_tx.clone());
    // The in-flight run never completes on its own.
    executor.push_run(FakeRun::Hang);
    let invocations = executor.invocations_handle();
    let cancels = executor.cancel_count_handle();

    let runtime = Runtime::new(
        CoreTask::new(options),
        Arc::clone(&host),
        event_rx,
        event_tx.clone(),
        executor,
        outcome_tx,
    );
    let handle = tokio::spawn(runtime.run());

    // 1. Wait for the service subscription, then trigger a run.
    for _ in 0..100 {
        if !host.start_calls().is_empty() {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    host.push_build(true);

    // 2. Wait until the run is actually in flight.
    for _ in 0..100 {
        if !invocations.lock().unwrap().is_empty() {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }

    // 3. Ask for cancellation, the way the signal handler would.
    event_tx.send(TaskEvent::CancelRequested).await?;

    // 4. The runtime winds down with a cancellation failure.
    let outcome = timeout(Duration::from_secs(3), handle).await???;
    assert!(!outcome.success);
    assert_eq!(outcome.error_message.as_deref(), Some("Run cancelled"));
    assert_eq!(outcome.exit_code, None);

    assert!(cancels.load(std::sync::atomic::Ordering::SeqCst) >= 1);
    assert_eq!(host.statuses(), vec!["Error: Run cancelled".to_string()]);

    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn cancelling_a_real_process_kills_it_without_an_exit_event() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("ticks");

    let host = Arc::new(FakeHost::new());
    let (event_tx, mut event_rx) = mpsc::channel::<TaskEvent>(16);
    let mut executor = RealCommandExecutor::new(Arc::clone(&host), event_tx);

    let invocation = CommandInvocation {
        command: format!(
            ": > {m}; while :; do echo tick >> {m}; sleep 0.1; done",
            m = marker.display()
        ),
        args: Vec::new(),
        working_directory: std::env::temp_dir(),
    };
    executor.run(invocation).await?;

    // 1. The process launches and starts ticking.
    let launched = timeout(Duration::from_secs(5), event_rx.recv())
        .await?
        .expect("launch event");
    assert_eq!(launched, TaskEvent::CommandLaunched);

    // 2. Cancel and wait for the kill to finish.
    executor.cancel_active().await;

    // 3. No exit event follows a cancellation.
    let next = timeout(Duration::from_millis(500), event_rx.recv()).await;
    assert!(next.is_err(), "cancelled run must not emit events");

    // 4. The process is really gone: the marker file stops growing.
    let size_after_kill = std::fs::metadata(&marker)?.len();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(std::fs::metadata(&marker)?.len(), size_after_kill);

    Ok(())
}
