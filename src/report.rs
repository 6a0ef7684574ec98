// src/report.rs

//! Outcome reporting.
//!
//! Failures reach the user before the outcome value exists: first a
//! short status line, then the log entry, then the `TaskOutcome`.
//! Anything consuming an outcome can therefore rely on the user having
//! already been told what went wrong.

use crate::engine::TaskOutcome;
use crate::errors::TaskError;
use crate::host::{Host, LogLevel};

/// Produce the outcome for a successful run.
///
/// Success is quiet; the command's own output has already been
/// streamed, so there is nothing left to say.
pub fn success() -> TaskOutcome {
    TaskOutcome::succeeded()
}

/// Report a failed run and produce the matching outcome.
pub fn failure<H: Host>(host: &H, err: &TaskError) -> TaskOutcome {
    let message = err.to_string();
    host.report_status(&format!("Error: {}", message));
    host.log(LogLevel::Error, &message);
    TaskOutcome::from_error(err)
}

/// Surface a failed watch-mode build that does not end the task.
///
/// The run triggered by this build still happens; the user just gets
/// told the service's output is stale first.
pub fn build_failure<H: Host>(host: &H) {
    host.report_status("Dev server build failed");
    host.log(
        LogLevel::Warn,
        "dev server reported a failed build; running command anyway",
    );
}
