//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Telegram notifications for dvmn.org code reviews
#[derive(Parser, Debug)]
#[command(name = "review-watcher")]
#[command(about = "Telegram notifications for dvmn.org code reviews")]
#[command(long_about = "
review-watcher long-polls the dvmn.org review API and sends a Telegram message
for every graded submission. Its own log records are relayed to a second,
operator-facing bot.

EXAMPLES:
    # Watch with the default configuration
    review-watcher

    # Use a custom configuration file
    review-watcher --config /path/to/config.toml run

    # Validate configuration without polling
    review-watcher run --dry-run

    # Stop after ten polls
    review-watcher --verbose run --max-iterations 10

    # Check the API token and print the current review cursor
    review-watcher check

Credentials can also be given as DVMN_TOKEN, TG_BOT_TOKEN, TG_LOG_BOT_TOKEN
and TG_CHAT_ID, from the environment or a .env file.
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Use a single TOML file instead of the layered `config/` directory.
    /// The file must exist and be readable.
    ///
    /// Example: --config /etc/review-watcher/production.toml
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects the `config/{environment}.toml` overlay.
    ///
    /// Available values: development (dev), production (prod), test
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging
    ///
    /// Sets the log level to debug. Debug records are never relayed.
    /// Cannot be used with --quiet.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    ///
    /// Sets the log level to error, which also limits what is relayed.
    /// Cannot be used with --verbose.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Watch for review results and notify (default)
    ///
    /// Bootstraps the cursor from the newest review, then long-polls forever.
    ///
    /// Examples:
    ///   review-watcher run                      # Watch until stopped
    ///   review-watcher run --dry-run            # Validate config and exit
    ///   review-watcher run --max-iterations 3   # Stop after three polls
    Run {
        /// Validate configuration and exit
        ///
        /// Returns exit code 0 if valid, non-zero if invalid.
        #[arg(long)]
        dry_run: bool,

        /// Stop after this many polls
        #[arg(long, value_name = "N", value_parser = super::validation::validate_max_iterations)]
        max_iterations: Option<u64>,
    },
    /// Verify credentials and print the current review cursor
    ///
    /// Calls the review API once and asks Telegram for the names of both bots.
    Check,
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "production", alias = "prod")]
    Production,
    #[value(name = "test")]
    Test,
}

impl Cli {
    /// Command to run, `run` when none was given
    pub fn effective_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run {
            dry_run: false,
            max_iterations: None,
        })
    }

    /// Whether this invocation polls the review API
    ///
    /// Only watching runs relay their logs; `check` and dry runs report on
    /// the terminal.
    pub fn is_watching(&self) -> bool {
        matches!(self.effective_command(), Commands::Run { dry_run: false, .. })
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Production => crate::config::Environment::Production,
            Environment::Test => crate::config::Environment::Test,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_flag() {
        let result = Cli::try_parse_from(["review-watcher", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["review-watcher", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_default_behavior() {
        let cli = Cli::try_parse_from(["review-watcher"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
        assert!(cli.env.is_none());
        assert_eq!(
            cli.effective_command(),
            Commands::Run {
                dry_run: false,
                max_iterations: None
            }
        );
        assert!(cli.is_watching());
    }

    #[test]
    fn test_run_command() {
        let cli =
            Cli::try_parse_from(["review-watcher", "run", "--max-iterations", "5"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Run {
                dry_run: false,
                max_iterations: Some(5)
            })
        );
    }

    #[test]
    fn test_dry_run_is_not_watching() {
        let cli = Cli::try_parse_from(["review-watcher", "run", "--dry-run"]).unwrap();
        assert!(!cli.is_watching());
    }

    #[test]
    fn test_check_command() {
        let cli = Cli::try_parse_from(["review-watcher", "check"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Check));
        assert!(!cli.is_watching());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let result = Cli::try_parse_from(["review-watcher", "run", "--max-iterations", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_env_alias() {
        let cli = Cli::try_parse_from(["review-watcher", "--env", "prod"]).unwrap();
        assert!(matches!(cli.env, Some(Environment::Production)));
    }

    #[test]
    fn test_conflicting_verbose_quiet() {
        let result = Cli::try_parse_from(["review-watcher", "--verbose", "--quiet"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
