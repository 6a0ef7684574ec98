// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the configured
//! command, using `tokio::process::Command`, and reporting back to the
//! orchestration runtime via `TaskEvent`s.
//!
//! - [`command`] handles a single command process: spawn, stream
//!   output to the host, wait or cancel.
//! - [`backend`] provides the `CommandExecutor` trait and the concrete
//!   `RealCommandExecutor` the runtime uses in production, which tests
//!   can replace with a fake implementation.

pub mod backend;
pub mod command;

use std::path::PathBuf;

use crate::config::TaskOptions;

/// A single command invocation: what to run and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub command: String,
    pub args: Vec<String>,
    pub working_directory: PathBuf,
}

impl CommandInvocation {
    pub fn from_options(options: &TaskOptions) -> Self {
        Self {
            command: options.command.clone(),
            args: options.args.clone(),
            working_directory: options.working_directory.clone(),
        }
    }

    /// Full command line as handed to the shell.
    pub fn shell_line(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

pub use backend::{CommandExecutor, RealCommandExecutor};
pub use command::{run_command, shell_command};
