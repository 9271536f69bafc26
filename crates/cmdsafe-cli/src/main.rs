//! cmdsafe CLI - Encrypted storage for command lines that carry secrets
//!
//! This is the command-line interface for cmdsafe. It provides a user-friendly
//! interface to the core library functionality.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cmdsafe_core::VERSION;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{delete, list, misc, print, run as run_cmd, save};
use crate::constants::{exit_codes, LOG_ENV};
use crate::errors::CliError;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                exit_codes::USAGE
            } else {
                exit_codes::SUCCESS
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    init_tracing(cli.verbose);

    let ctx = AppContext::new(&cli);
    match run(&ctx, &cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            if let Some(cli_err) = e.downcast_ref::<CliError>() {
                cli_err.exit();
            }
            let error_msg = format!("{:#}", e);
            eprintln!("Error: {}", error_msg);
            if let Some(hint) = extract_error_hint(&error_msg) {
                eprintln!("{}", hint);
            }
            std::process::exit(exit_codes::FAILURE);
        }
    }
}

/// Log to stderr, filtered by CMDSAFE_LOG. `--verbose` raises the default to debug.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Provide contextual hints for common error patterns.
fn extract_error_hint(error: &str) -> Option<String> {
    let error_lower = error.to_lowercase();

    if error_lower.contains("invalid signature") || error_lower.contains("does not belong to") {
        return Some(
            "Hint: The stored command was modified outside cmdsafe. Save it again with -r."
                .to_string(),
        );
    }

    if error_lower.contains("unsupported algorithm") {
        return Some(
            "Hint: The stored command was written by an incompatible version or altered."
                .to_string(),
        );
    }

    if error_lower.contains("failed to start") {
        return Some(
            "Hint: Check the saved executable with `cmdsafe print <HANDLE>`.".to_string(),
        );
    }

    if error_lower.contains("database is locked") {
        return Some("Hint: Another cmdsafe process is writing to the store.".to_string());
    }

    None
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Some(Commands::Save(args)) => save::handle_save(ctx, args),
        Some(Commands::Run(args)) => run_cmd::handle_run(ctx, args),
        Some(Commands::List(args)) => list::handle_list(ctx, args),
        Some(Commands::Print(args)) => print::handle_print(ctx, args),
        Some(Commands::Delete(args)) => delete::handle_delete(ctx, args),
        Some(Commands::Completions(args)) => misc::handle_completions(args),
        None => {
            println!("cmdsafe v{}", VERSION);
            println!("\nQuickstart:");
            println!("  cmdsafe save --name db mysql -u root -pS3cret");
            println!("  cmdsafe run db");
            println!("  cmdsafe list");
            println!("\nRun `cmdsafe --help` for full usage.");
            Ok(exit_codes::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_for_tampering() {
        let hint = extract_error_hint(
            "Invalid signature, the data may have been tampered with",
        );
        assert!(hint.unwrap().contains("modified outside cmdsafe"));
    }

    #[test]
    fn test_hint_for_start_failure() {
        let hint = extract_error_hint("db failed to start: No such file or directory");
        assert!(hint.unwrap().contains("cmdsafe print"));
    }

    #[test]
    fn test_no_hint_for_unknown_errors() {
        assert!(extract_error_hint("something else").is_none());
    }
}
