//! Application context for the cmdsafe CLI.
//!
//! Provides a unified context that combines CLI arguments with
//! lazily-loaded configuration.

use std::io::IsTerminal;
use std::path::PathBuf;

use once_cell::unsync::OnceCell;

use cmdsafe_core::{SqliteStore, Vault};

use crate::cli::Cli;
use crate::config::Settings;

use super::resolver::{load_settings, resolve_store_path};

/// Application context that bundles CLI args with configuration.
///
/// This avoids repeatedly loading config and threading multiple parameters
/// through handler functions.
pub struct AppContext<'a> {
    cli: &'a Cli,
    settings: OnceCell<Settings>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            settings: OnceCell::new(),
        }
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Whether prompts can be shown.
    pub fn interactive(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    /// Get the settings, loading them lazily if needed.
    pub fn settings(&self) -> anyhow::Result<&Settings> {
        self.settings.get_or_try_init(load_settings)
    }

    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        resolve_store_path(self.cli, self.settings()?)
    }

    /// Open the vault over the resolved store with configured KDF costs.
    pub fn vault(&self) -> anyhow::Result<Vault<SqliteStore>> {
        let path = self.store_path()?;
        tracing::debug!(path = %path.display(), "using command store");
        let params = self.settings()?.scrypt_params();
        Ok(Vault::new(SqliteStore::new(path)).with_params(params))
    }
}
