// src/engine/mod.rs

//! Orchestration engine for serverun.
//!
//! Ties together the task lifecycle (start the service, wait for a
//! build, run the command, repeat in watch mode) with the event loop
//! that feeds it: service build updates, command launch/exit events,
//! and cancellation signals.
//!
//! [`core`] holds the pure state machine; [`runtime`] is its async IO
//! shell.

use crate::errors::TaskError;

/// Outcome of a single command process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    Failed(i32),
}

/// Reportable result of a run.
///
/// One of these is published per command invocation, and the runtime
/// returns the last one as the overall result of the task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub success: bool,
    pub error_message: Option<String>,
    pub exit_code: Option<i32>,
}

impl TaskOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error_message: None,
            exit_code: None,
        }
    }

    pub fn from_error(err: &TaskError) -> Self {
        Self {
            success: false,
            error_message: Some(err.to_string()),
            exit_code: err.exit_code(),
        }
    }
}

/// Events flowing into the runtime from the service stream, the
/// executor, and the signal handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    /// The dependent service finished a build.
    ServiceBuildCompleted { success: bool },
    /// The dependent service's update stream failed.
    ServiceStreamFailed { message: String },
    /// The dependent service's update stream ended.
    ServiceStreamClosed,
    /// The command process was spawned and is now running.
    CommandLaunched,
    /// The command process could not be spawned.
    CommandLaunchFailed { message: String },
    /// The command process exited.
    CommandExited { outcome: CommandOutcome },
    /// Cancellation requested (e.g. Ctrl-C).
    CancelRequested,
}

/// Lifecycle state of the orchestrated task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Created, `start()` not called yet.
    Idle,
    /// Service starting; waiting for its first build.
    StartingService,
    /// Waiting for the next rebuild (watch mode, between runs).
    Ready,
    /// A command process is in flight.
    RunningCommand,
    /// Terminal: last run succeeded.
    Succeeded,
    /// Terminal: failed, cancelled, or the last run failed.
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

/// Command produced by the pure core, to be executed by the outer IO
/// shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start the dependent service and subscribe to its updates.
    StartService { target: String, watch: bool },
    /// Spawn one invocation of the configured command.
    RunCommand,
    /// Kill the in-flight command invocation, if any.
    CancelCommand,
    /// Report a successful run to the host.
    ReportSuccess,
    /// Report a failed run to the host.
    ReportFailure(TaskError),
    /// Tell the host the service build that triggered this cycle
    /// failed (the command still runs against the previous output).
    ReportBuildFailure,
}

/// Decision returned by the core after handling a single [`TaskEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

pub mod core;
pub mod runtime;

pub use core::CoreTask;
pub use runtime::Runtime;
