//! shipyard: pipeline steps for 1Password secrets and Replicated CMX clusters

mod cli;
mod commands;
mod errors;
mod tracing;

use crate::cli::{Cli, parse};
use crate::errors::{CliError, CliResult};
use crate::tracing::TracingConfig;
use std::time::Duration;

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    if let Err(error) = run_main().await {
        eprintln!("{error:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> miette::Result<()> {
    let cli = parse();

    let tracing_config = TracingConfig {
        format: cli.tracing_format(),
        level: cli.level.into(),
    };
    crate::tracing::init_tracing(tracing_config)?;

    run_cli(cli).await?;
    Ok(())
}

async fn run_cli(cli: Cli) -> CliResult<()> {
    let name = cli.command.name();
    let execution = commands::execute(cli.command);

    match cli.timeout_secs {
        Some(seconds) => tokio::time::timeout(Duration::from_secs(seconds), execution)
            .await
            .map_err(|_| {
                ::tracing::warn!(command = name, seconds, "Command timed out");
                CliError::Timeout {
                    command: name.to_string(),
                    seconds,
                }
            })?,
        None => execution.await,
    }
}
