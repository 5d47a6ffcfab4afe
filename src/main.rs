//! Binary entry point for agentic-context.
//!
//! This binary provides the CLI and the Claude Code hook entry points for the
//! playbook engine.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow unnecessary_wraps for consistent command function signatures
#![allow(clippy::unnecessary_wraps)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use agentic_context::config::AgenticContextConfig;
use agentic_context::hooks::EMPTY_RESPONSE;
use agentic_context::observability;
use clap::{Parser, Subcommand};
use commands::HookEvent;
use std::path::PathBuf;
use std::process::ExitCode;

/// Agentic Context - a self-curating playbook for AI coding agents.
#[derive(Parser)]
#[command(name = "agentic-context")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Print the playbook as it would be injected.
    Show,

    /// Apply an extraction result (operations and evaluations) to the playbook.
    Apply {
        /// JSON file to read; stdin when omitted.
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Remove entries with disproportionate harmful feedback.
    Prune,

    /// Collapse near-duplicate entries.
    Dedup {
        /// Similarity threshold in [0, 1].
        #[arg(short, long)]
        threshold: Option<f32>,
    },

    /// Rewrite the stored playbook in the current format.
    Migrate,

    /// Handle Claude Code hooks.
    Hook {
        /// Hook event type.
        #[command(subcommand)]
        event: HookEvent,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();
    let is_hook = matches!(cli.command, Commands::Hook { .. });

    let config = match AgenticContextConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return setup_failure(is_hook);
        },
    };

    if let Err(e) = observability::init(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize observability: {e}");
        return setup_failure(is_hook);
    }

    match run_command(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Exit path for failures before a command runs.
///
/// Hook callers still get an empty JSON response on stdout.
fn setup_failure(is_hook: bool) -> ExitCode {
    if is_hook {
        println!("{EMPTY_RESPONSE}");
    }
    ExitCode::FAILURE
}

/// Runs the selected command.
fn run_command(
    command: Commands,
    config: AgenticContextConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Show => commands::cmd_show(&config),
        Commands::Apply { input } => commands::cmd_apply(&config, input.as_deref()),
        Commands::Prune => commands::cmd_prune(&config),
        Commands::Dedup { threshold } => commands::cmd_dedup(config, threshold),
        Commands::Migrate => commands::cmd_migrate(&config),
        Commands::Hook { event } => commands::cmd_hook(event, &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_dedup_threshold() {
        let cli = Cli::try_parse_from(["agentic-context", "dedup", "--threshold", "0.9"]).unwrap();
        assert!(matches!(cli.command, Commands::Dedup { threshold: Some(t) } if (t - 0.9).abs() < f32::EPSILON));
    }

    #[test]
    fn test_parse_hook_event() {
        let cli =
            Cli::try_parse_from(["agentic-context", "-v", "hook", "user-prompt-submit"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Hook {
                event: HookEvent::UserPromptSubmit
            }
        ));
    }
}
