use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};

use crate::app::AppContext;
use crate::cli::ListArgs;
use crate::constants::exit_codes;
use crate::errors::from_core;
use crate::output::format_saved_at;

pub fn handle_list(ctx: &AppContext, args: &ListArgs) -> anyhow::Result<i32> {
    let vault = ctx.vault()?;
    let entries = vault.entries().map_err(from_core)?;

    if args.json {
        let items: Vec<serde_json::Value> = entries
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "handle": entry.handle,
                    "saved_at": entry.saved_at,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(exit_codes::SUCCESS);
    }

    if args.long {
        if entries.is_empty() {
            if !ctx.quiet() {
                eprintln!("No saved commands.");
            }
            return Ok(exit_codes::SUCCESS);
        }
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Handle", "Saved"]);
        for entry in &entries {
            table.add_row(vec![entry.handle.clone(), format_saved_at(&entry.saved_at)]);
        }
        println!("{table}");
        return Ok(exit_codes::SUCCESS);
    }

    for entry in &entries {
        println!("{}", entry.handle);
    }
    Ok(exit_codes::SUCCESS)
}
