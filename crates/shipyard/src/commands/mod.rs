//! Command execution

pub mod cluster;
pub mod secret;

use crate::cli::Commands;
use crate::errors::{CliError, CliResult};
use std::io::Write;

/// Run one parsed command to completion
pub async fn execute(command: Commands) -> CliResult<()> {
    match command {
        Commands::Secret { subcommand } => secret::execute(subcommand).await,
        Commands::Cluster { subcommand } => cluster::execute(subcommand).await,
    }
}

/// Write command output to stdout exactly as given
fn emit(output: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| CliError::io("write to stdout", e))
}

/// Write command output to stdout followed by a newline
fn emit_line(output: &str) -> CliResult<()> {
    emit(&format!("{output}\n"))
}
