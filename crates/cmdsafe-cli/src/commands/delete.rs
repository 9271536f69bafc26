use dialoguer::Confirm;

use cmdsafe_core::{CmdsafeError, CommandStore};

use crate::app::AppContext;
use crate::cli::DeleteArgs;
use crate::constants::exit_codes;
use crate::errors::from_core;

pub fn handle_delete(ctx: &AppContext, args: &DeleteArgs) -> anyhow::Result<i32> {
    let vault = ctx.vault()?;
    if vault.store().get(&args.handle).map_err(from_core)?.is_none() {
        return Err(from_core(CmdsafeError::HandleNotFound(args.handle.clone())));
    }

    let skip_prompt = args.yes || ctx.quiet() || !ctx.interactive();
    if !skip_prompt {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {}?", args.handle))
            .default(false)
            .interact()
            .map_err(|e| anyhow::anyhow!("Failed to read confirmation: {}", e))?;
        if !confirmed {
            eprintln!("Cancelled.");
            return Ok(exit_codes::SUCCESS);
        }
    }

    vault.delete(&args.handle).map_err(from_core)?;
    if !ctx.quiet() {
        println!("Deleted {}", args.handle);
    }
    Ok(exit_codes::SUCCESS)
}
