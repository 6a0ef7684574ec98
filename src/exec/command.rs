// src/exec/command.rs

//! Single command process execution.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::engine::{CommandOutcome, TaskEvent};
use crate::exec::CommandInvocation;
use crate::host::{Host, LogLevel};

/// Build the platform shell invocation for `line`, rooted at
/// `working_directory`.
///
/// Both the command and the dependent service go through the shell, so
/// things like `npm run e2e -- --headless` work unquoted.
pub fn shell_command(line: &str, working_directory: &Path) -> Command {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(line);
        c
    };

    cmd.current_dir(working_directory)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    cmd
}

/// Run a single command process, forwarding its output to the host and
/// emitting `CommandLaunched` / `CommandExited` events.
///
/// - If spawning fails, a `CommandLaunchFailed` event is emitted and
///   nothing else happens for this invocation.
/// - If the cancel channel fires, the child process is killed and
///   **no** exit event is sent. This keeps completions from cancelled
///   runs out of the state machine.
pub async fn run_command<H: Host>(
    invocation: CommandInvocation,
    host: Arc<H>,
    event_tx: mpsc::Sender<TaskEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let line = invocation.shell_line();
    info!(
        command = %line,
        cwd = %invocation.working_directory.display(),
        "starting command process"
    );

    let mut cmd = shell_command(&line, &invocation.working_directory);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            warn!(command = %line, error = %err, "failed to launch command");
            let _ = event_tx
                .send(TaskEvent::CommandLaunchFailed {
                    message: err.to_string(),
                })
                .await;
            return;
        }
    };

    let _ = event_tx.send(TaskEvent::CommandLaunched).await;

    // Forward both output streams to the host as lines arrive. Always
    // consume them so the child's pipe buffers don't fill.
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        let host = Arc::clone(&host);
        readers.push(tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                host.log(LogLevel::Info, &line);
            }
        }));
    }
    if let Some(stderr) = child.stderr.take() {
        let host = Arc::clone(&host);
        readers.push(tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                host.log(LogLevel::Warn, &line);
            }
        }));
    }

    // Either the process exits on its own (normal case), or we receive
    // a cancellation request.
    tokio::select! {
        status_res = child.wait() => {
            let outcome = match status_res {
                Ok(status) => {
                    let code = status.code().unwrap_or(-1);
                    info!(
                        command = %line,
                        exit_code = code,
                        success = status.success(),
                        "command process exited"
                    );
                    if status.success() {
                        CommandOutcome::Success
                    } else {
                        CommandOutcome::Failed(code)
                    }
                }
                Err(err) => {
                    warn!(command = %line, error = %err, "failed waiting for command process");
                    CommandOutcome::Failed(-1)
                }
            };

            // Drain any trailing output before announcing the exit, so
            // logs from a run always precede its result.
            for reader in readers {
                let _ = reader.await;
            }

            let _ = event_tx.send(TaskEvent::CommandExited { outcome }).await;
        }

        cancel = &mut cancel_rx => {
            match cancel {
                Ok(()) => {
                    info!(command = %line, "cancellation requested; killing command process");
                    if let Err(err) = child.kill().await {
                        warn!(
                            command = %line,
                            error = %err,
                            "failed to kill command process on cancellation"
                        );
                    }
                    // The kill closes the pipes; let the readers hit EOF.
                    for reader in readers {
                        let _ = reader.await;
                    }
                    // Do NOT send CommandExited for this cancelled invocation.
                }
                Err(err) => {
                    debug!(
                        command = %line,
                        error = %err,
                        "cancel channel closed without explicit cancellation"
                    );
                    // Child will be killed on drop due to kill_on_drop(true).
                }
            }
        }
    }
}
