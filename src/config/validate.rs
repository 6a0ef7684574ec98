// src/config/validate.rs

use regex::Regex;

use crate::cli::CliArgs;
use crate::config::model::{
    RawOptionsFile, ResolvedOptions, ResolvedService, ServicePatterns,
};
use crate::errors::{Result, RunnerError};

/// Merge CLI flags over the config file and validate the result.
///
/// Merge rules are per-field: a flag given on the command line wins,
/// anything else falls back to the file, and `watch` is on if either
/// side enables it.
pub fn merge_and_validate(args: &CliArgs, raw: RawOptionsFile) -> Result<ResolvedOptions> {
    let command = args
        .command
        .clone()
        .or(raw.command)
        .ok_or_else(|| {
            RunnerError::ConfigError(
                "no command given; pass --command or set `command` in the config file"
                    .to_string(),
            )
        })?;

    let cmd_args = if args.args.is_empty() {
        raw.args
    } else {
        args.args.clone()
    };

    let file_service = raw.service;
    let target = args
        .service
        .clone()
        .or_else(|| file_service.as_ref().map(|s| s.target.clone()));
    let ready = args
        .ready_pattern
        .clone()
        .or_else(|| file_service.as_ref().and_then(|s| s.ready_pattern.clone()));
    let fail = args
        .fail_pattern
        .clone()
        .or_else(|| file_service.as_ref().and_then(|s| s.fail_pattern.clone()));

    let service = resolve_service(target, ready, fail)?;

    Ok(ResolvedOptions {
        command,
        args: cmd_args,
        watch: args.watch || raw.watch,
        service,
    })
}

fn resolve_service(
    target: Option<String>,
    ready: Option<String>,
    fail: Option<String>,
) -> Result<Option<ResolvedService>> {
    let Some(target) = target else {
        if ready.is_some() || fail.is_some() {
            return Err(RunnerError::ConfigError(
                "--ready-pattern/--fail-pattern need a service; pass --service or add a \
                 [service] section"
                    .to_string(),
            ));
        }
        return Ok(None);
    };

    if target.trim().is_empty() {
        return Err(RunnerError::ConfigError(
            "service target must not be empty".to_string(),
        ));
    }

    let Some(ready) = ready else {
        return Err(RunnerError::ConfigError(format!(
            "service '{}' has no ready pattern; set `ready_pattern` so builds can be detected",
            target
        )));
    };

    let patterns = ServicePatterns {
        ready: compile_pattern("ready_pattern", &ready)?,
        fail: match fail {
            Some(f) => Some(compile_pattern("fail_pattern", &f)?),
            None => None,
        },
    };

    Ok(Some(ResolvedService { target, patterns }))
}

fn compile_pattern(field: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|err| {
        RunnerError::ConfigError(format!("invalid {} regex '{}': {}", field, pattern, err))
    })
}
