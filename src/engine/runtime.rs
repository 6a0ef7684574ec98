// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::exec::{CommandExecutor, CommandInvocation};
use crate::host::{Host, LogLevel};
use crate::report;
use crate::serve::{self, ServiceHandle};

use super::core::CoreTask;
use super::{CoreCommand, TaskEvent, TaskOutcome};

/// Drives the task lifecycle in response to `TaskEvent`s, and
/// delegates actual command execution to a `CommandExecutor`.
///
/// This is a pure IO shell around `CoreTask`, which contains all the
/// lifecycle semantics. This struct handles async IO: reading events
/// from channels, starting the service, dispatching command runs and
/// publishing outcomes.
pub struct Runtime<H: Host, E: CommandExecutor> {
    core: CoreTask,
    host: Arc<H>,
    event_rx: mpsc::Receiver<TaskEvent>,
    /// Kept for the service forwarder; also means the event channel
    /// never closes while the runtime is alive.
    event_tx: mpsc::Sender<TaskEvent>,
    executor: E,
    outcome_tx: mpsc::Sender<TaskOutcome>,
    service: Option<ServiceHandle>,
    last_outcome: Option<TaskOutcome>,
}

impl<H: Host, E: CommandExecutor> fmt::Debug for Runtime<H, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<H: Host, E: CommandExecutor> Runtime<H, E> {
    pub fn new(
        core: CoreTask,
        host: Arc<H>,
        event_rx: mpsc::Receiver<TaskEvent>,
        event_tx: mpsc::Sender<TaskEvent>,
        executor: E,
        outcome_tx: mpsc::Sender<TaskOutcome>,
    ) -> Self {
        Self {
            core,
            host,
            event_rx,
            event_tx,
            executor,
            outcome_tx,
            service: None,
            last_outcome: None,
        }
    }

    /// Main event loop.
    ///
    /// - Kicks the core off (start the service or run straight away).
    /// - Consumes `TaskEvent`s from `event_rx`.
    /// - Feeds them into the pure core.
    /// - Executes commands returned by the core (start service, run,
    ///   cancel, report).
    ///
    /// Returns the final outcome of the task once the core reaches a
    /// terminal state.
    pub async fn run(mut self) -> Result<TaskOutcome> {
        info!("serverun runtime started");

        if self.core.options().watch && self.core.options().service_target.is_none() {
            self.host.log(
                LogLevel::Warn,
                "watch mode without a service has nothing to watch; running the command once",
            );
        }

        // Events the shell synthesises itself (e.g. a service that
        // failed to start) are handled before anything new from the
        // channel.
        let mut pending: VecDeque<TaskEvent> = VecDeque::new();

        let mut step = self.core.start();

        loop {
            let synthetic = self.execute_commands(step.commands).await?;
            pending.extend(synthetic);

            if !step.keep_running {
                info!("core reached a terminal state; stopping runtime");
                break;
            }

            let event = match pending.pop_front() {
                Some(event) => event,
                None => match self.event_rx.recv().await {
                    Some(event) => event,
                    None => {
                        warn!("runtime event channel closed; exiting");
                        break;
                    }
                },
            };

            debug!(?event, "runtime received event");

            step = self.core.step(event);
        }

        self.shutdown().await;

        self.last_outcome
            .ok_or_else(|| anyhow::anyhow!("task ended without producing an outcome").into())
    }

    /// Execute the commands from one core step.
    ///
    /// Failures that belong to the task (a service that won't start)
    /// come back as synthetic events to feed the core; an `Err` is
    /// reserved for broken plumbing.
    async fn execute_commands(&mut self, commands: Vec<CoreCommand>) -> Result<Vec<TaskEvent>> {
        let mut synthetic = Vec::new();

        for command in commands {
            match command {
                CoreCommand::StartService { target, watch } => {
                    match serve::start_service(
                        self.host.as_ref(),
                        &target,
                        watch,
                        self.event_tx.clone(),
                    ) {
                        Ok(handle) => self.service = Some(handle),
                        Err(err) => {
                            warn!(
                                service = %target,
                                error = %err,
                                "failed to start dependent service"
                            );
                            synthetic.push(TaskEvent::ServiceStreamFailed {
                                message: err.to_string(),
                            });
                        }
                    }
                }
                CoreCommand::RunCommand => {
                    let invocation = CommandInvocation::from_options(self.core.options());
                    self.host.log(
                        LogLevel::Info,
                        &format!("Running command: {}", invocation.shell_line()),
                    );
                    self.executor.run(invocation).await?;
                }
                CoreCommand::CancelCommand => {
                    self.executor.cancel_active().await;
                }
                CoreCommand::ReportSuccess => {
                    let outcome = report::success();
                    self.publish_outcome(outcome).await;
                }
                CoreCommand::ReportFailure(err) => {
                    let outcome = report::failure(self.host.as_ref(), &err);
                    self.publish_outcome(outcome).await;
                }
                CoreCommand::ReportBuildFailure => {
                    report::build_failure(self.host.as_ref());
                }
            }
        }

        Ok(synthetic)
    }

    /// Remember the outcome and offer it to the host's result channel.
    ///
    /// The channel is best effort: a host that stopped listening does
    /// not stall the run.
    async fn publish_outcome(&mut self, outcome: TaskOutcome) {
        self.last_outcome = Some(outcome.clone());
        if self.outcome_tx.send(outcome).await.is_err() {
            debug!("outcome receiver dropped; keeping result locally");
        }
    }

    /// Tear down whatever is still alive: the in-flight command (if
    /// any) and the service subscription.
    async fn shutdown(&mut self) {
        self.executor.cancel_active().await;
        if let Some(service) = self.service.take() {
            service.release();
        }
        debug!("runtime cleanup complete");
    }
}
