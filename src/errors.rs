// src/errors.rs

//! Crate-wide error aliases and the task failure taxonomy.

use thiserror::Error;

/// Infrastructure errors: anything that stops serverun itself from
/// operating, as opposed to the task it runs failing.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Ways the task itself can fail. These are reported through the host
/// and folded into the final outcome, never propagated as `Err`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The dependent service's first build failed before the command
    /// ever ran, so the run's precondition was not met.
    #[error("Failed to run the dev server for {target}!")]
    Precondition { target: String },

    /// The command could not be spawned at all.
    #[error("Failed to launch {command}: {message}")]
    Launch { command: String, message: String },

    /// The command ran and exited non-zero.
    #[error("Command {command} exited with code {code}")]
    Execution { command: String, code: i32 },

    /// The dependent service's update stream errored.
    #[error("Dev server stream failed: {message}")]
    ServiceStream { message: String },

    /// The run was cancelled before the command finished.
    #[error("Run cancelled")]
    Cancelled,
}

impl TaskError {
    /// Exit code to surface for this failure, when one exists.
    /// Only execution failures carry the child's real code; every other
    /// failure happens before or outside the command process.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            TaskError::Execution { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunnerError>;
