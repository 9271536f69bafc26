//! Path resolution for config and store files.

use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::{default_config_path, default_store_path, read_config, Settings};
use crate::constants::CONFIG_ENV;

/// Resolve the config file path, checking CMDSAFE_CONFIG env var first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var(CONFIG_ENV) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Load settings from the config file. A missing file means defaults.
pub fn load_settings() -> anyhow::Result<Settings> {
    let path = resolve_config_path()?;
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Settings::default());
    }
    tracing::debug!(path = %path.display(), "loading config");
    read_config(&path)
}

/// Resolve the store path: `--db`/CMDSAFE_DB, then config, then the XDG default.
pub fn resolve_store_path(cli: &Cli, settings: &Settings) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.db.clone() {
        return Ok(path);
    }
    if let Some(path) = settings.store.path.as_deref() {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    default_store_path()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreSection;
    use clap::Parser;

    #[test]
    fn test_db_flag_wins_over_config() {
        let cli = Cli::try_parse_from(["cmdsafe", "--db", "/flag.db", "list"]).unwrap();
        let settings = Settings {
            store: StoreSection {
                path: Some("/config.db".to_string()),
            },
            ..Settings::default()
        };
        assert_eq!(
            resolve_store_path(&cli, &settings).unwrap(),
            PathBuf::from("/flag.db")
        );
    }

    #[test]
    fn test_config_path_used_without_flag() {
        let cli = Cli::try_parse_from(["cmdsafe", "list"]).unwrap();
        if cli.db.is_some() {
            // CMDSAFE_DB is set in the environment running the tests.
            return;
        }
        let settings = Settings {
            store: StoreSection {
                path: Some("/config.db".to_string()),
            },
            ..Settings::default()
        };
        assert_eq!(
            resolve_store_path(&cli, &settings).unwrap(),
            PathBuf::from("/config.db")
        );
    }
}
