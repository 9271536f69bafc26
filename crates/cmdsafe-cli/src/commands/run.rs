use cmdsafe_core::vault::launch;
use cmdsafe_core::{RunMode, RunOutcome};

use crate::app::{unlock_record, AppContext};
use crate::cli::RunArgs;
use crate::errors::from_core;

pub fn handle_run(ctx: &AppContext, args: &RunArgs) -> anyhow::Result<i32> {
    let vault = ctx.vault()?;
    let record = unlock_record(ctx, &vault, &args.handle)?;
    let mode = if args.detach {
        RunMode::Detached
    } else {
        RunMode::Attached
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let outcome = runtime
        .block_on(launch(&record, &args.extra, mode))
        .map_err(from_core)?;

    match outcome {
        RunOutcome::Detached { pid } => {
            if !ctx.quiet() {
                eprintln!("Started {} in the background (pid {})", args.handle, pid);
            }
        }
        RunOutcome::Exited(exit) => {
            if let Some(signal) = exit.signal {
                tracing::info!(handle = %args.handle, signal, "child killed by signal");
            }
        }
    }
    Ok(outcome.exit_code())
}
