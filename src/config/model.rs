// src/config/model.rs

use std::path::PathBuf;

use regex::Regex;
use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// command = "npm"
/// args = ["run", "e2e"]
/// watch = false
///
/// [service]
/// target = "npm run dev"
/// ready_pattern = "compiled successfully"
/// fail_pattern = "compiled with errors"
/// ```
///
/// Every field is optional here; the CLI can supply or override any of
/// them, and [`crate::config::validate`] decides what the merged result
/// must contain.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawOptionsFile {
    /// The command to run once the service (if any) is ready.
    #[serde(default)]
    pub command: Option<String>,

    /// Arguments appended to the command line.
    #[serde(default)]
    pub args: Vec<String>,

    /// Keep running and re-run the command on every rebuild.
    #[serde(default)]
    pub watch: bool,

    /// `[service]` section describing the dependent dev server.
    #[serde(default)]
    pub service: Option<ServiceSection>,
}

/// `[service]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSection {
    /// Shell command that starts the dev server.
    pub target: String,

    /// Regex matched against server stdout marking a successful build.
    #[serde(default)]
    pub ready_pattern: Option<String>,

    /// Regex matched against server stdout marking a failed build.
    #[serde(default)]
    pub fail_pattern: Option<String>,
}

/// Compiled stdout patterns for build detection.
#[derive(Debug, Clone)]
pub struct ServicePatterns {
    pub ready: Regex,
    pub fail: Option<Regex>,
}

/// A fully resolved service description: what to start and how to tell
/// a build apart from ordinary log noise.
#[derive(Debug, Clone)]
pub struct ResolvedService {
    pub target: String,
    pub patterns: ServicePatterns,
}

/// The merged CLI + file view of a run, after validation.
///
/// This is what the rest of the crate consumes; nothing downstream of
/// here looks at `RawOptionsFile` or `CliArgs` again.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub command: String,
    pub args: Vec<String>,
    pub watch: bool,
    pub service: Option<ResolvedService>,
}

/// Per-run task options handed to the engine.
///
/// Unlike [`ResolvedOptions`] this carries the concrete working
/// directory and only the service fields the state machine cares
/// about; the compiled patterns stay with the host that does the
/// matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOptions {
    pub command: String,
    pub args: Vec<String>,
    pub service_target: Option<String>,
    pub working_directory: PathBuf,
    pub watch: bool,
}

impl TaskOptions {
    pub fn from_resolved(resolved: &ResolvedOptions, working_directory: PathBuf) -> Self {
        Self {
            command: resolved.command.clone(),
            args: resolved.args.clone(),
            service_target: resolved.service.as_ref().map(|s| s.target.clone()),
            working_directory,
            watch: resolved.watch,
        }
    }
}
