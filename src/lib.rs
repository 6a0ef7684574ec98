// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod host;
pub mod logging;
pub mod report;
pub mod serve;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::resolve_options;
use crate::config::model::{ResolvedOptions, TaskOptions};
use crate::engine::{CoreTask, Runtime, TaskEvent, TaskOutcome};
use crate::exec::RealCommandExecutor;
use crate::host::{Host, ProcessHost};

/// Entry point behind the binary: resolve options, build the process
/// host and executor, wire up Ctrl-C, and drive the runtime to its
/// final outcome.
pub async fn run(args: CliArgs) -> Result<TaskOutcome> {
    let resolved = resolve_options(&args)?;

    if args.dry_run {
        print_dry_run(&resolved);
        return Ok(TaskOutcome::succeeded());
    }

    let host = Arc::new(ProcessHost::new(
        args.project_root.clone(),
        resolved.service.as_ref().map(|s| s.patterns.clone()),
    ));

    let working_directory = host.resolve_project_root()?;
    let options = TaskOptions::from_resolved(&resolved, working_directory);
    info!(command = %options.command, watch = options.watch, "resolved task");

    // Task event channel: service updates, process events, signals.
    let (event_tx, event_rx) = mpsc::channel::<TaskEvent>(64);

    // Result channel towards the host side. Outcomes are already
    // logged as they happen, so the binary just drains it.
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<TaskOutcome>(16);
    tokio::spawn(async move { while outcome_rx.recv().await.is_some() {} });

    // Process executor (real implementation in production).
    let executor = RealCommandExecutor::new(Arc::clone(&host), event_tx.clone());

    // Ctrl-C → cancel the run.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(TaskEvent::CancelRequested).await;
        });
    }

    // Construct the pure core (single source of truth for semantics).
    let core = CoreTask::new(options);

    // Construct the async IO shell around the core.
    let runtime = Runtime::new(core, host, event_rx, event_tx, executor, outcome_tx);
    Ok(runtime.run().await?)
}

/// Simple dry-run output: print the resolved run.
fn print_dry_run(resolved: &ResolvedOptions) {
    println!("serverun dry-run");
    println!("  command: {}", resolved.command);
    if !resolved.args.is_empty() {
        println!("  args: {:?}", resolved.args);
    }
    println!("  watch: {}", resolved.watch);
    match &resolved.service {
        Some(service) => {
            println!("  service: {}", service.target);
            println!("    ready_pattern: {}", service.patterns.ready.as_str());
            if let Some(fail) = &service.patterns.fail {
                println!("    fail_pattern: {}", fail.as_str());
            }
        }
        None => println!("  service: (none)"),
    }

    debug!("dry-run complete (no execution)");
}
