//! Passphrase handling with retry logic.

use dialoguer::Password;
use secrecy::{ExposeSecret, SecretString};

use cmdsafe_core::crypto::validate_passphrase;
use cmdsafe_core::{CmdsafeError, CommandRecord, CommandStore, Vault};

use crate::constants::{MAX_PASSPHRASE_ATTEMPTS, PASSPHRASE_ENV};
use crate::errors::{from_core, CliError};

use super::AppContext;

fn env_passphrase() -> Option<SecretString> {
    std::env::var(PASSPHRASE_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

fn no_tty_error() -> anyhow::Error {
    CliError::auth_failed_with_hint(
        "No passphrase provided and no TTY available",
        format!("Hint: Set {} for non-interactive use.", PASSPHRASE_ENV),
    )
    .into()
}

/// Passphrase for sealing a command: env var, or prompt twice.
pub fn read_new_passphrase(ctx: &AppContext) -> anyhow::Result<SecretString> {
    let passphrase = match env_passphrase() {
        Some(passphrase) => passphrase,
        None if ctx.interactive() => Password::new()
            .with_prompt("Enter passphrase")
            .with_confirmation("Repeat passphrase", "Passphrases do not match")
            .interact()
            .map(SecretString::from)
            .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))?,
        None => return Err(no_tty_error()),
    };
    validate_passphrase(passphrase.expose_secret()).map_err(from_core)?;
    Ok(passphrase)
}

fn prompt_existing_passphrase() -> anyhow::Result<SecretString> {
    Password::new()
        .with_prompt("Passphrase")
        .interact()
        .map(SecretString::from)
        .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))
}

/// Decrypt the record saved under `handle`, prompting until the passphrase
/// passes the key-hash check.
///
/// A passphrase from the environment gets a single attempt.
pub fn unlock_record<S: CommandStore>(
    ctx: &AppContext,
    vault: &Vault<S>,
    handle: &str,
) -> anyhow::Result<CommandRecord> {
    let envelope = vault.fetch_envelope(handle).map_err(from_core)?;

    let from_env = env_passphrase();
    if from_env.is_none() && !ctx.interactive() {
        return Err(no_tty_error());
    }
    let max_attempts = if from_env.is_some() {
        1
    } else {
        MAX_PASSPHRASE_ATTEMPTS
    };

    let mut from_env = from_env;
    for attempt in 1..=max_attempts {
        let passphrase = match from_env.take() {
            Some(passphrase) => passphrase,
            None => prompt_existing_passphrase()?,
        };

        match vault.unlock(&envelope, passphrase.expose_secret()) {
            Ok(key) => {
                return vault
                    .open_record(handle, &envelope, &key)
                    .map_err(from_core);
            }
            Err(CmdsafeError::IncorrectPassphrase) => {
                tracing::debug!(handle, attempt, "passphrase rejected");
                if attempt < max_attempts {
                    eprintln!("Incorrect passphrase, try again.");
                }
            }
            Err(err) => return Err(from_core(err)),
        }
    }

    if max_attempts == 1 {
        Err(CliError::auth_failed("Incorrect passphrase").into())
    } else {
        Err(CliError::auth_failed_with_hint(
            "Incorrect passphrase",
            format!("Hint: Gave up after {} attempts.", max_attempts),
        )
        .into())
    }
}
