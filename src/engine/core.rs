// src/engine/core.rs

//! Pure core task state machine.
//!
//! A synchronous, deterministic core: each [`TaskEvent`] fed into
//! [`CoreTask::step`] yields the next lifecycle state plus the commands
//! the IO shell should carry out. Channel plumbing, process spawning
//! and outcome reporting all stay in `engine::runtime::Runtime`.
//!
//! Keeping the semantics here means they can be unit tested without
//! Tokio, channels, or processes.

use std::collections::VecDeque;

use crate::config::TaskOptions;
use crate::engine::{CommandOutcome, CoreCommand, CoreStep, TaskEvent, TaskState};
use crate::errors::TaskError;

/// Pure core task state.
///
/// Owns the task options, the lifecycle state, and the builds that
/// arrived while a command was in flight (watch mode). No channels, no
/// Tokio types, no IO.
#[derive(Debug)]
pub struct CoreTask {
    options: TaskOptions,
    state: TaskState,
    /// True between a successful spawn and that process's exit; while
    /// armed, a cancel must kill the in-flight process.
    armed: bool,
    /// Build results seen while a command was in flight, oldest first.
    /// Never coalesced: each entry produces exactly one command run.
    pending_builds: VecDeque<bool>,
    /// The service stream has ended; no further builds will arrive.
    service_stopped: bool,
    /// Result of the most recently finished run.
    last_run_success: Option<bool>,
}

impl CoreTask {
    pub fn new(options: TaskOptions) -> Self {
        Self {
            options,
            state: TaskState::Idle,
            armed: false,
            pending_builds: VecDeque::new(),
            service_stopped: false,
            last_run_success: None,
        }
    }

    pub fn options(&self) -> &TaskOptions {
        &self.options
    }

    /// Expose the current lifecycle state (for tests).
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Expose whether a command process is believed in flight (for
    /// tests).
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Expose the number of queued builds (for tests).
    pub fn pending_build_count(&self) -> usize {
        self.pending_builds.len()
    }

    /// Kick the task off. Must be called exactly once, before any
    /// [`step`](Self::step).
    ///
    /// With a service target this starts the service and waits for its
    /// first build; without one the command runs immediately and the
    /// task finishes when it exits, watch mode or not.
    pub fn start(&mut self) -> CoreStep {
        if self.state != TaskState::Idle {
            return self.noop();
        }

        match self.options.service_target.clone() {
            Some(target) => {
                self.state = TaskState::StartingService;
                CoreStep {
                    commands: vec![CoreCommand::StartService {
                        target,
                        watch: self.options.watch,
                    }],
                    keep_running: true,
                }
            }
            None => {
                // No service to wait for or watch, so there is exactly
                // one run.
                self.service_stopped = true;
                let mut commands = Vec::new();
                self.dispatch_run(true, &mut commands);
                CoreStep {
                    commands,
                    keep_running: true,
                }
            }
        }
    }

    /// Handle a single task event, updating core state and returning
    /// the resulting commands for the IO shell.
    ///
    /// Once a terminal state is reached every further event is
    /// absorbed without effect.
    pub fn step(&mut self, event: TaskEvent) -> CoreStep {
        if self.state.is_terminal() {
            return self.noop();
        }

        match event {
            TaskEvent::ServiceBuildCompleted { success } => self.handle_service_build(success),
            TaskEvent::ServiceStreamFailed { message } => self.handle_stream_failed(message),
            TaskEvent::ServiceStreamClosed => self.handle_stream_closed(),
            TaskEvent::CommandLaunched => self.handle_command_launched(),
            TaskEvent::CommandLaunchFailed { message } => self.handle_launch_failed(message),
            TaskEvent::CommandExited { outcome } => self.handle_command_exited(outcome),
            TaskEvent::CancelRequested => self.handle_cancel(),
        }
    }

    fn handle_service_build(&mut self, success: bool) -> CoreStep {
        let mut commands = Vec::new();

        match self.state {
            TaskState::StartingService => {
                if !success && !self.options.watch {
                    // A single-build run whose very first build failed
                    // never gets to run the command at all.
                    self.state = TaskState::Failed;
                    return CoreStep {
                        commands: vec![CoreCommand::ReportFailure(TaskError::Precondition {
                            target: self.options.service_target.clone().unwrap_or_default(),
                        })],
                        keep_running: false,
                    };
                }
                self.dispatch_run(success, &mut commands);
            }
            TaskState::Ready => {
                self.dispatch_run(success, &mut commands);
            }
            TaskState::RunningCommand => {
                if self.options.watch {
                    // Queue it; the run for this build starts once the
                    // current one exits.
                    self.pending_builds.push_back(success);
                }
                // Outside watch mode the single run is already in
                // flight; late service output changes nothing.
            }
            TaskState::Idle | TaskState::Succeeded | TaskState::Failed => {}
        }

        CoreStep {
            commands,
            keep_running: true,
        }
    }

    fn handle_stream_failed(&mut self, message: String) -> CoreStep {
        let mut commands = Vec::new();
        if self.state == TaskState::RunningCommand {
            commands.push(CoreCommand::CancelCommand);
        }
        commands.push(CoreCommand::ReportFailure(TaskError::ServiceStream {
            message,
        }));
        self.state = TaskState::Failed;
        CoreStep {
            commands,
            keep_running: false,
        }
    }

    fn handle_stream_closed(&mut self) -> CoreStep {
        match self.state {
            TaskState::StartingService => {
                // The service went away before reporting a single
                // build; the command never gets its precondition.
                self.state = TaskState::Failed;
                CoreStep {
                    commands: vec![CoreCommand::ReportFailure(TaskError::ServiceStream {
                        message: "service stream closed before reporting a build".to_string(),
                    })],
                    keep_running: false,
                }
            }
            TaskState::Ready => {
                // Nothing in flight and nothing more will arrive.
                self.state = self.terminal_from_last_run();
                CoreStep {
                    commands: Vec::new(),
                    keep_running: false,
                }
            }
            TaskState::RunningCommand => {
                // Let the in-flight run finish; queued builds still
                // get their runs before the task ends.
                self.service_stopped = true;
                self.noop()
            }
            TaskState::Idle | TaskState::Succeeded | TaskState::Failed => self.noop(),
        }
    }

    fn handle_command_launched(&mut self) -> CoreStep {
        if self.state == TaskState::RunningCommand {
            self.armed = true;
        }
        self.noop()
    }

    fn handle_launch_failed(&mut self, message: String) -> CoreStep {
        if self.state != TaskState::RunningCommand {
            return self.noop();
        }

        self.last_run_success = Some(false);
        let mut commands = vec![CoreCommand::ReportFailure(TaskError::Launch {
            command: self.options.command.clone(),
            message,
        })];

        if !self.options.watch {
            self.state = TaskState::Failed;
            return CoreStep {
                commands,
                keep_running: false,
            };
        }

        let keep_running = self.advance_after_run(&mut commands);
        CoreStep {
            commands,
            keep_running,
        }
    }

    fn handle_command_exited(&mut self, outcome: CommandOutcome) -> CoreStep {
        if self.state != TaskState::RunningCommand {
            return self.noop();
        }

        self.armed = false;
        self.last_run_success = Some(outcome == CommandOutcome::Success);

        let mut commands = vec![match outcome {
            CommandOutcome::Success => CoreCommand::ReportSuccess,
            CommandOutcome::Failed(code) => CoreCommand::ReportFailure(TaskError::Execution {
                command: self.options.command.clone(),
                code,
            }),
        }];

        if !self.options.watch {
            self.state = match outcome {
                CommandOutcome::Success => TaskState::Succeeded,
                CommandOutcome::Failed(_) => TaskState::Failed,
            };
            return CoreStep {
                commands,
                keep_running: false,
            };
        }

        let keep_running = self.advance_after_run(&mut commands);
        CoreStep {
            commands,
            keep_running,
        }
    }

    fn handle_cancel(&mut self) -> CoreStep {
        let mut commands = Vec::new();
        if self.state == TaskState::RunningCommand && self.armed {
            commands.push(CoreCommand::CancelCommand);
        }
        commands.push(CoreCommand::ReportFailure(TaskError::Cancelled));
        self.state = TaskState::Failed;
        CoreStep {
            commands,
            keep_running: false,
        }
    }

    /// After a run finishes in watch mode: start the next queued run,
    /// or go back to waiting, or finish if the service is gone.
    fn advance_after_run(&mut self, commands: &mut Vec<CoreCommand>) -> bool {
        if let Some(build_success) = self.pending_builds.pop_front() {
            self.dispatch_run(build_success, commands);
            return true;
        }

        if self.service_stopped {
            self.state = self.terminal_from_last_run();
            return false;
        }

        self.state = TaskState::Ready;
        true
    }

    /// Emit the commands for one run of the configured command.
    ///
    /// A run triggered by a failed build is still a run; the host just
    /// gets told about the failed build first.
    fn dispatch_run(&mut self, build_success: bool, commands: &mut Vec<CoreCommand>) {
        if !build_success {
            commands.push(CoreCommand::ReportBuildFailure);
        }
        commands.push(CoreCommand::RunCommand);
        self.armed = false;
        self.state = TaskState::RunningCommand;
    }

    fn terminal_from_last_run(&self) -> TaskState {
        if self.last_run_success.unwrap_or(false) {
            TaskState::Succeeded
        } else {
            TaskState::Failed
        }
    }

    fn noop(&self) -> CoreStep {
        CoreStep {
            commands: Vec::new(),
            keep_running: !self.state.is_terminal(),
        }
    }
}
