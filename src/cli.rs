// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Flags mirror the config file fields; anything given on the command
//! line takes precedence over `Serverun.toml`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `serverun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "serverun",
    version,
    about = "Run a shell command once a dependent dev server reports a build.",
    long_about = None
)]
pub struct CliArgs {
    /// The command to run (executed through the platform shell).
    #[arg(long, value_name = "CMD")]
    pub command: Option<String>,

    /// Argument appended to the command line; repeat for multiple.
    /// Values may start with `-`, e.g. `--arg --headless`.
    #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Shell command that starts the dependent dev server.
    ///
    /// When set, the command only runs after the server reports a
    /// successful build (see `--ready-pattern`).
    #[arg(long, value_name = "CMD")]
    pub service: Option<String>,

    /// Regex matched against the server's stdout to detect a
    /// successful build.
    #[arg(long, value_name = "REGEX")]
    pub ready_pattern: Option<String>,

    /// Regex matched against the server's stdout to detect a failed
    /// build. Optional; without it only successes are detected.
    #[arg(long, value_name = "REGEX")]
    pub fail_pattern: Option<String>,

    /// Keep running: re-run the command on every rebuild the server
    /// reports instead of finishing after the first run.
    #[arg(long)]
    pub watch: bool,

    /// Project root the command and server run in.
    ///
    /// Default: the current working directory.
    #[arg(long, value_name = "PATH")]
    pub project_root: Option<PathBuf>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Serverun.toml` in the current working directory, if it
    /// exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SERVERUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved run, but don't execute
    /// anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
