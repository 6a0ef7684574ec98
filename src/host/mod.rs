// src/host/mod.rs

//! Host integration seam.
//!
//! The engine never talks to the operating system or the user directly;
//! everything goes through a [`Host`]. Production code uses
//! [`ProcessHost`], which spawns a real dev server process and logs via
//! `tracing`. Tests substitute a fake host that scripts service updates
//! and records log and status calls.

pub mod process;

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::errors::Result;

pub use process::ProcessHost;

/// Severity for host-directed log lines.
///
/// Command and service output is forwarded through this rather than
/// straight to `tracing` so tests can observe exactly what the user
/// would have seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

/// One update from a running dependent service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceUpdate {
    /// The service finished a build; `success` says whether it worked.
    Build { success: bool },
    /// The service's update stream itself failed.
    Error { message: String },
}

/// Everything the engine needs from its surroundings.
///
/// Implementations must be cheap to share: the runtime holds one in an
/// `Arc` and hands clones to the process readers.
pub trait Host: Send + Sync + 'static {
    /// Absolute directory the command and service run in.
    fn resolve_project_root(&self) -> Result<PathBuf>;

    /// Start the dependent service and return its stream of updates.
    ///
    /// The stream stays open for as long as the service runs; dropping
    /// the receiver is the signal to shut the service down. `watch`
    /// controls whether the service keeps reporting builds after the
    /// first one.
    fn start_target(&self, target: &str, watch: bool) -> Result<mpsc::Receiver<ServiceUpdate>>;

    /// Write one line of user-facing log output.
    fn log(&self, level: LogLevel, message: &str);

    /// Publish a short progress/status line (shown before log output
    /// when both are emitted for the same event).
    fn report_status(&self, status: &str);
}
