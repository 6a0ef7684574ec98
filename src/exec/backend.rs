// src/exec/backend.rs

//! Pluggable command executor abstraction.
//!
//! The runtime talks to a `CommandExecutor` instead of spawning
//! processes itself. This makes it easy to swap in a fake executor in
//! tests while keeping the production implementation in [`command`].
//!
//! - `RealCommandExecutor` is the default implementation used by
//!   `serverun`. It spawns the command through the platform shell and
//!   keeps track of the one invocation that may be in flight.
//! - Tests can provide their own `CommandExecutor` that records
//!   invocations and directly emits `CommandExited` events.
//!
//! [`command`]: crate::exec::command

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::engine::TaskEvent;
use crate::errors::Result;
use crate::exec::CommandInvocation;
use crate::host::Host;

use super::command::run_command;

/// Trait abstracting how command invocations are executed.
///
/// Production code uses [`RealCommandExecutor`]; tests can provide
/// their own implementation that doesn't spawn real processes.
pub trait CommandExecutor: Send {
    /// Spawn one invocation of the command.
    ///
    /// Implementations report progress exclusively through
    /// `TaskEvent`s (`CommandLaunched`, `CommandLaunchFailed`,
    /// `CommandExited`). An `Err` here means the executor itself
    /// broke, not that the command failed.
    fn run(
        &mut self,
        invocation: CommandInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Kill the in-flight invocation, if any, and wait until its
    /// process is gone. A cancelled invocation emits no further
    /// events.
    fn cancel_active(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Bookkeeping for the one invocation that may be in flight.
struct ActiveCommand {
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl ActiveCommand {
    fn request_cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            // The receiver is gone once the process has exited;
            // nothing left to cancel then.
            let _ = tx.send(());
        }
    }
}

/// Real executor used in production.
///
/// Spawns the command through the platform shell and manages at most
/// one child process at a time. The runtime only dispatches a new run
/// after the previous one has exited, so the replacement path below is
/// a safety net rather than a feature.
pub struct RealCommandExecutor<H: Host> {
    host: Arc<H>,
    event_tx: mpsc::Sender<TaskEvent>,
    active: Option<ActiveCommand>,
}

impl<H: Host> RealCommandExecutor<H> {
    pub fn new(host: Arc<H>, event_tx: mpsc::Sender<TaskEvent>) -> Self {
        Self {
            host,
            event_tx,
            active: None,
        }
    }
}

impl<H: Host> CommandExecutor for RealCommandExecutor<H> {
    fn run(
        &mut self,
        invocation: CommandInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        if let Some(active) = &self.active {
            if !active.handle.is_finished() {
                warn!(
                    command = %invocation.command,
                    "command dispatched while a previous invocation is still running; \
                     cancelling the old one"
                );
            }
        }
        if let Some(mut previous) = self.active.take() {
            previous.request_cancel();
        }

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let host = Arc::clone(&self.host);
        let event_tx = self.event_tx.clone();
        let handle = tokio::spawn(run_command(invocation, host, event_tx, cancel_rx));
        self.active = Some(ActiveCommand {
            cancel: Some(cancel_tx),
            handle,
        });

        Box::pin(async move { Ok(()) })
    }

    fn cancel_active(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let active = self.active.take();
        Box::pin(async move {
            if let Some(mut active) = active {
                active.request_cancel();
                // Wait for the runner to finish killing the child so
                // no process outlives the cancellation.
                let _ = active.handle.await;
            }
        })
    }
}
