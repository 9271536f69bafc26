use clap::CommandFactory;
use clap_complete::generate;

use crate::cli::{Cli, CompletionsArgs};
use crate::constants::exit_codes;

pub fn handle_completions(args: &CompletionsArgs) -> anyhow::Result<i32> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "cmdsafe", &mut std::io::stdout());
    Ok(exit_codes::SUCCESS)
}
