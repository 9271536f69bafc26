use secrecy::ExposeSecret;

use cmdsafe_core::{CmdsafeError, CommandRecord, CommandStore};

use crate::app::{read_new_passphrase, AppContext};
use crate::cli::SaveArgs;
use crate::constants::exit_codes;
use crate::errors::{from_core, CliError};

pub fn handle_save(ctx: &AppContext, args: &SaveArgs) -> anyhow::Result<i32> {
    let (executable, rest) = args.split_command().ok_or_else(|| {
        CliError::invalid_input(
            "Missing command to save",
            "Hint: cmdsafe save --name <HANDLE> <EXECUTABLE> [ARGS]...",
        )
    })?;
    let record = CommandRecord::new(args.name.as_str(), executable, rest.iter().cloned())
        .map_err(from_core)?;

    let vault = ctx.vault()?;
    // Fail before prompting if the handle is taken.
    if !args.replace && vault.store().get(&args.name).map_err(from_core)?.is_some() {
        return Err(from_core(CmdsafeError::HandleExists(args.name.clone())));
    }

    let passphrase = read_new_passphrase(ctx)?;
    vault
        .save(&record, passphrase.expose_secret(), args.replace)
        .map_err(from_core)?;

    if !ctx.quiet() {
        println!("Saved {}", args.name);
    }
    Ok(exit_codes::SUCCESS)
}
