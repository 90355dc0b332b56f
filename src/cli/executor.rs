//! Command executor for dispatching CLI commands
//!
//! This module provides the main entry point for executing CLI commands
//! after parsing and configuration loading.

use super::handlers::{CheckCommandHandler, RunCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::AppResult;

/// Execute a CLI command with the given settings
///
/// This function dispatches to the appropriate command handler based on
/// the parsed CLI arguments; no subcommand means `run`.
///
/// # Arguments
/// * `cli` - Parsed CLI arguments
/// * `settings` - Merged and validated settings
///
/// # Errors
/// Returns errors from command handlers
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    match cli.effective_command() {
        Commands::Run {
            dry_run,
            max_iterations,
        } => {
            RunCommandHandler::new(settings)
                .execute(dry_run, max_iterations)
                .await
        }
        Commands::Check => CheckCommandHandler::new(settings).execute().await,
    }
}
