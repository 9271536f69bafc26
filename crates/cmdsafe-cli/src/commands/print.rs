use crate::app::{unlock_record, AppContext};
use crate::cli::PrintArgs;
use crate::constants::exit_codes;
use crate::output::{print_record, record_json};

pub fn handle_print(ctx: &AppContext, args: &PrintArgs) -> anyhow::Result<i32> {
    let vault = ctx.vault()?;
    let record = unlock_record(ctx, &vault, &args.handle)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record_json(&record))?);
    } else {
        print_record(&record, ctx.quiet());
    }
    Ok(exit_codes::SUCCESS)
}
