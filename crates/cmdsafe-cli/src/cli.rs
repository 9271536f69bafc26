use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use cmdsafe_core::VERSION;

/// cmdsafe - Encrypted storage for command lines that carry secrets
#[derive(Parser)]
#[command(name = "cmdsafe")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the command store
    #[arg(long, global = true, env = "CMDSAFE_DB", value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt and save a command under a handle
    Save(SaveArgs),

    /// Decrypt and run a saved command
    Run(RunArgs),

    /// List saved handles
    List(ListArgs),

    /// Decrypt a saved command and print it
    Print(PrintArgs),

    /// Delete a saved command
    Delete(DeleteArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `save` command
#[derive(Args)]
pub struct SaveArgs {
    /// Handle used to refer to the saved command
    #[arg(short, long, value_name = "HANDLE")]
    pub name: String,

    /// Replace an existing command saved under the same handle
    #[arg(short, long)]
    pub replace: bool,

    /// Executable followed by its arguments
    #[arg(
        value_name = "COMMAND",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

impl SaveArgs {
    /// Split the command line into executable and arguments.
    pub fn split_command(&self) -> Option<(&str, &[String])> {
        self.command
            .split_first()
            .map(|(executable, args)| (executable.as_str(), args))
    }
}

/// Arguments for the `run` command
#[derive(Args)]
pub struct RunArgs {
    /// Start the command in the background and return immediately
    #[arg(short, long)]
    pub detach: bool,

    /// Handle of the saved command
    #[arg(value_name = "HANDLE")]
    pub handle: String,

    /// Extra arguments appended after the saved ones
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub extra: Vec<String>,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Show a table with save times
    #[arg(short, long)]
    pub long: bool,

    /// Output as JSON
    #[arg(long, conflicts_with = "long")]
    pub json: bool,
}

/// Arguments for the `print` command
#[derive(Args)]
pub struct PrintArgs {
    /// Handle of the saved command
    #[arg(value_name = "HANDLE")]
    pub handle: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `delete` command
#[derive(Args)]
pub struct DeleteArgs {
    /// Handle of the saved command
    #[arg(value_name = "HANDLE")]
    pub handle: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
