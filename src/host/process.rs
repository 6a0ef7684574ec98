// src/host/process.rs

//! Production [`Host`] backed by real processes and `tracing`.

use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::ServicePatterns;
use crate::errors::{Result, RunnerError};
use crate::exec::shell_command;
use crate::host::{Host, LogLevel, ServiceUpdate};

/// Host that spawns the dependent service as a shell child process and
/// derives build updates from its stdout using the configured
/// patterns. Log and status output goes to `tracing`.
pub struct ProcessHost {
    project_root: PathBuf,
    patterns: Option<ServicePatterns>,
}

impl ProcessHost {
    /// `root` defaults to the current directory. It is canonicalised
    /// here once, so the command and the service both see the same
    /// absolute path regardless of platform.
    pub fn new(root: Option<PathBuf>, patterns: Option<ServicePatterns>) -> Self {
        let root = root.unwrap_or_else(|| PathBuf::from("."));
        let project_root = root.canonicalize().unwrap_or(root);
        Self {
            project_root,
            patterns,
        }
    }
}

impl Host for ProcessHost {
    fn resolve_project_root(&self) -> Result<PathBuf> {
        Ok(self.project_root.clone())
    }

    fn start_target(&self, target: &str, watch: bool) -> Result<mpsc::Receiver<ServiceUpdate>> {
        let patterns = self.patterns.clone().ok_or_else(|| {
            RunnerError::ConfigError(format!(
                "service '{}' started without stdout patterns; set `ready_pattern`",
                target
            ))
        })?;

        info!(service = %target, watch, "starting dependent service process");

        let mut cmd = shell_command(target, &self.project_root);
        let mut child = cmd.spawn()?;

        // Always consume stderr so the service can't block on a full
        // pipe; log at debug.
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("service stderr: {}", line);
                }
            });
        }

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(monitor_service(child, patterns, watch, tx));

        Ok(rx)
    }

    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => error!("{}", message),
            LogLevel::Warn => warn!("{}", message),
            LogLevel::Info => info!("{}", message),
            LogLevel::Debug => debug!("{}", message),
        }
    }

    fn report_status(&self, status: &str) {
        info!("status: {}", status);
    }
}

/// Watch the service's stdout for build results and report them until
/// the receiver goes away or the process exits.
///
/// The child stays owned here; every return path drops it, which kills
/// the dev server thanks to `kill_on_drop`.
async fn monitor_service(
    mut child: Child,
    patterns: ServicePatterns,
    watch: bool,
    tx: mpsc::Sender<ServiceUpdate>,
) {
    let mut emitted = false;

    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            tokio::select! {
                next = lines.next_line() => match next {
                    Ok(Some(line)) => {
                        debug!("service stdout: {}", line);
                        if !watch && emitted {
                            // A single-build service reports once; the
                            // rest of its output is just noise to us.
                            continue;
                        }
                        if let Some(success) = classify_line(&line, &patterns) {
                            emitted = true;
                            debug!(success, "service build detected");
                            if tx.send(ServiceUpdate::Build { success }).await.is_err() {
                                debug!("service update receiver dropped; stopping dev server");
                                return;
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        warn!(error = %err, "failed reading service stdout");
                        break;
                    }
                },
                _ = tx.closed() => {
                    debug!("service update receiver dropped; stopping dev server");
                    return;
                }
            }
        }
    }

    // stdout has ended, so the process is on its way out.
    match child.wait().await {
        Ok(status) => {
            info!(
                exit_code = status.code().unwrap_or(-1),
                "dependent service exited"
            );
            if !emitted {
                // A service that ran to completion without matching
                // any pattern counts as one build with its exit
                // status.
                let _ = tx
                    .send(ServiceUpdate::Build {
                        success: status.success(),
                    })
                    .await;
            }
        }
        Err(err) => {
            warn!(error = %err, "failed waiting for dependent service");
            if !emitted {
                let _ = tx
                    .send(ServiceUpdate::Error {
                        message: err.to_string(),
                    })
                    .await;
            }
        }
    }
    // tx drops here; the runtime sees the stream close.
}

/// Decide whether `line` marks a finished build.
///
/// The fail pattern wins when a line matches both.
fn classify_line(line: &str, patterns: &ServicePatterns) -> Option<bool> {
    if let Some(fail) = &patterns.fail {
        if fail.is_match(line) {
            return Some(false);
        }
    }
    if patterns.ready.is_match(line) {
        return Some(true);
    }
    None
}
