// src/main.rs

use serverun::engine::TaskOutcome;
use serverun::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(outcome) if outcome.success => {}
        Ok(outcome) => {
            // Propagate the failed command's exit code to the shell;
            // failures without one become a generic 1.
            std::process::exit(outcome.exit_code.unwrap_or(1));
        }
        Err(err) => {
            eprintln!("serverun error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<TaskOutcome> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
