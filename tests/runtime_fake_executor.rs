// tests/runtime_fake_executor.rs

use std::error::Error;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use serverun::engine::{CommandOutcome, CoreTask, Runtime, TaskEvent, TaskOutcome};
use serverun::host::LogLevel;
use serverun_test_utils::builders::TaskOptionsBuilder;
use serverun_test_utils::fake_executor::{FakeCommandExecutor, FakeRun};
use serverun_test_utils::fake_host::FakeHost;
use serverun_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

struct Fixture {
    host: Arc<FakeHost>,
    executor: FakeCommandExecutor,
    event_tx: mpsc::Sender<TaskEvent>,
    event_rx: mpsc::Receiver<TaskEvent>,
    outcome_tx: mpsc::Sender<TaskOutcome>,
    outcome_rx: mpsc::Receiver<TaskOutcome>,
}

fn fixture() -> Fixture {
    init_tracing();
    let (event_tx, event_rx) = mpsc::channel::<TaskEvent>(16);
    let (outcome_tx, outcome_rx) = mpsc::channel::<TaskOutcome>(16);
    Fixture {
        host: Arc::new(FakeHost::new()),
        executor: FakeCommandExecutor::new(event_tx.clone()),
        event_tx,
        event_rx,
        outcome_tx,
        outcome_rx,
    }
}

impl Fixture {
    fn runtime(self, core: CoreTask) -> (Runtime<FakeHost, FakeCommandExecutor>, RuntimeProbes) {
        let probes = RuntimeProbes {
            host: Arc::clone(&self.host),
            invocations: self.executor.invocations_handle(),
            outcome_rx: self.outcome_rx,
        };
        let runtime = Runtime::new(
            core,
            self.host,
            self.event_rx,
            self.event_tx,
            self.executor,
            self.outcome_tx,
        );
        (runtime, probes)
    }
}

struct RuntimeProbes {
    host: Arc<FakeHost>,
    invocations: Arc<std::sync::Mutex<Vec<serverun::exec::CommandInvocation>>>,
    outcome_rx: mpsc::Receiver<TaskOutcome>,
}

#[tokio::test]
async fn command_without_service_runs_once_and_succeeds() -> TestResult {
    let fx = fixture();
    let core = CoreTask::new(TaskOptionsBuilder::new("echo hello").build());
    let (runtime, mut probes) = fx.runtime(core);

    // Enforce an upper bound on how long this test may run.
    let run_result = timeout(Duration::from_secs(3), runtime.run()).await;

    let outcome = match run_result {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => panic!("runtime did not finish within 3 seconds"),
    };

    assert!(outcome.success);
    assert_eq!(outcome.exit_code, None);

    let recorded = probes.invocations.lock().unwrap().clone();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].command, "echo hello");
    assert!(probes.host.start_calls().is_empty());
    assert!(
        probes
            .host
            .log_messages()
            .iter()
            .any(|m| m.contains("Running command: echo hello"))
    );

    // The outcome also reached the result channel.
    let published = probes.outcome_rx.recv().await.expect("published outcome");
    assert!(published.success);

    Ok(())
}

#[tokio::test]
async fn failing_command_carries_its_exit_code() -> TestResult {
    let fx = fixture();
    fx.executor.push_run(FakeRun::Exit(CommandOutcome::Failed(7)));
    let core = CoreTask::new(TaskOptionsBuilder::new("npm run e2e").build());
    let (runtime, probes) = fx.runtime(core);

    let outcome = timeout(Duration::from_secs(3), runtime.run()).await??;

    assert!(!outcome.success);
    assert_eq!(outcome.exit_code, Some(7));
    let message = outcome.error_message.expect("failure carries a message");
    assert!(message.contains("npm run e2e"));
    assert!(message.contains("exited with code 7"));

    let statuses = probes.host.statuses();
    assert_eq!(statuses.len(), 1);
    assert!(statuses[0].starts_with("Error: "));

    Ok(())
}

#[tokio::test]
async fn failure_is_reported_before_the_outcome_is_published() -> TestResult {
    let fx = fixture();
    fx.executor.push_run(FakeRun::Exit(CommandOutcome::Failed(7)));
    let core = CoreTask::new(TaskOptionsBuilder::new("npm run e2e").build());
    let (runtime, mut probes) = fx.runtime(core);

    let handle = tokio::spawn(runtime.run());

    // By the time the outcome is observable on the channel, the status
    // line and the error log must already have happened.
    let published = with_timeout(probes.outcome_rx.recv())
        .await
        .expect("published outcome");
    assert!(!published.success);
    assert_eq!(probes.host.statuses().len(), 1);
    assert!(
        probes
            .host
            .logs()
            .iter()
            .any(|(level, m)| *level == LogLevel::Error && m.contains("exited with code 7"))
    );

    let final_outcome = timeout(Duration::from_secs(3), handle).await???;
    assert_eq!(final_outcome, published);

    Ok(())
}

#[tokio::test]
async fn successful_build_then_command_runs() -> TestResult {
    let fx = fixture();
    fx.host.queue_build(true);
    let options = TaskOptionsBuilder::new("npm run e2e")
        .service("npm run dev")
        .build();
    let (runtime, probes) = fx.runtime(CoreTask::new(options));

    let outcome = timeout(Duration::from_secs(3), runtime.run()).await??;

    assert!(outcome.success);
    assert_eq!(probes.host.start_calls(), vec![("npm run dev".to_string(), false)]);
    assert_eq!(probes.invocations.lock().unwrap().len(), 1);

    Ok(())
}

#[tokio::test]
async fn failed_first_build_without_watch_never_runs_the_command() -> TestResult {
    let fx = fixture();
    fx.host.queue_build(false);
    let options = TaskOptionsBuilder::new("npm run e2e")
        .service("npm run dev")
        .build();
    let (runtime, probes) = fx.runtime(CoreTask::new(options));

    let outcome = timeout(Duration::from_secs(3), runtime.run()).await??;

    assert!(!outcome.success);
    assert_eq!(outcome.exit_code, None);
    assert!(probes.invocations.lock().unwrap().is_empty());
    assert_eq!(
        probes.host.statuses(),
        vec!["Error: Failed to run the dev server for npm run dev!".to_string()]
    );

    Ok(())
}

#[tokio::test]
async fn service_start_failure_fails_the_task() -> TestResult {
    let fx = fixture();
    fx.host.fail_start("address already in use");
    let options = TaskOptionsBuilder::new("npm run e2e")
        .service("npm run dev")
        .build();
    let (runtime, probes) = fx.runtime(CoreTask::new(options));

    let outcome = timeout(Duration::from_secs(3), runtime.run()).await??;

    assert!(!outcome.success);
    let message = outcome.error_message.expect("failure carries a message");
    assert!(message.contains("address already in use"));
    assert!(probes.invocations.lock().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn launch_failure_without_watch_is_fatal() -> TestResult {
    let fx = fixture();
    fx.executor
        .push_run(FakeRun::LaunchFail("No such file or directory".to_string()));
    let core = CoreTask::new(TaskOptionsBuilder::new("not-a-real-binary").build());
    let (runtime, _probes) = fx.runtime(core);

    let outcome = timeout(Duration::from_secs(3), runtime.run()).await??;

    assert!(!outcome.success);
    assert_eq!(outcome.exit_code, None);
    let message = outcome.error_message.expect("failure carries a message");
    assert!(message.contains("Failed to launch"));
    assert!(message.contains("No such file or directory"));

    Ok(())
}
