use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use serverun::engine::{CommandOutcome, TaskEvent};
use serverun::errors::Result;
use serverun::exec::{CommandExecutor, CommandInvocation};

/// What one scripted invocation should do.
#[derive(Debug, Clone)]
pub enum FakeRun {
    /// Launch, then exit with the given outcome.
    Exit(CommandOutcome),
    /// Fail to spawn.
    LaunchFail(String),
    /// Launch and never exit (until cancelled).
    Hang,
}

/// A fake executor that:
/// - records every invocation it receives
/// - plays back a script of outcomes, one entry per `run` call
/// - counts `cancel_active` calls
///
/// An empty script defaults to immediate success, which keeps simple
/// tests short.
pub struct FakeCommandExecutor {
    event_tx: mpsc::Sender<TaskEvent>,
    script: Arc<Mutex<VecDeque<FakeRun>>>,
    invocations: Arc<Mutex<Vec<CommandInvocation>>>,
    cancels: Arc<AtomicUsize>,
}

impl FakeCommandExecutor {
    pub fn new(event_tx: mpsc::Sender<TaskEvent>) -> Self {
        Self {
            event_tx,
            script: Arc::new(Mutex::new(VecDeque::new())),
            invocations: Arc::new(Mutex::new(Vec::new())),
            cancels: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue the behaviour for the next unscripted `run` call.
    pub fn push_run(&self, run: FakeRun) {
        self.script.lock().unwrap().push_back(run);
    }

    /// Shared view of the recorded invocations; clone before moving
    /// the executor into the runtime.
    pub fn invocations_handle(&self) -> Arc<Mutex<Vec<CommandInvocation>>> {
        Arc::clone(&self.invocations)
    }

    /// Shared cancel counter; clone before moving the executor.
    pub fn cancel_count_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.cancels)
    }
}

impl CommandExecutor for FakeCommandExecutor {
    fn run(
        &mut self,
        invocation: CommandInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.event_tx.clone();
        let script = Arc::clone(&self.script);
        let invocations = Arc::clone(&self.invocations);

        Box::pin(async move {
            {
                let mut guard = invocations.lock().unwrap();
                guard.push(invocation);
            }

            let next = {
                let mut guard = script.lock().unwrap();
                guard.pop_front()
            };

            match next.unwrap_or(FakeRun::Exit(CommandOutcome::Success)) {
                FakeRun::Exit(outcome) => {
                    tx.send(TaskEvent::CommandLaunched)
                        .await
                        .map_err(anyhow::Error::from)?;
                    tx.send(TaskEvent::CommandExited { outcome })
                        .await
                        .map_err(anyhow::Error::from)?;
                }
                FakeRun::LaunchFail(message) => {
                    tx.send(TaskEvent::CommandLaunchFailed { message })
                        .await
                        .map_err(anyhow::Error::from)?;
                }
                FakeRun::Hang => {
                    tx.send(TaskEvent::CommandLaunched)
                        .await
                        .map_err(anyhow::Error::from)?;
                }
            }

            Ok(())
        })
    }

    fn cancel_active(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Box::pin(std::future::ready(()))
    }
}
