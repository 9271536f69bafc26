use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use cmdsafe_core::crypto::ScryptParams;

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreSection,
    pub kdf: KdfSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreSection {
    pub path: Option<String>,
}

/// scrypt cost parameters for newly saved commands.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct KdfSection {
    pub n: Option<u64>,
    pub r: Option<u32>,
    pub p: Option<u32>,
}

impl Settings {
    /// Configured cost parameters layered over the defaults.
    pub fn scrypt_params(&self) -> ScryptParams {
        let defaults = ScryptParams::default();
        ScryptParams::new(
            self.kdf.n.unwrap_or(defaults.n),
            self.kdf.r.unwrap_or(defaults.r),
            self.kdf.p.unwrap_or(defaults.p),
        )
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_store_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("commands.db"))
}

pub fn read_config(path: &Path) -> anyhow::Result<Settings> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("cmdsafe"));
        }
    }
    Ok(home_dir()?.join(".config").join("cmdsafe"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("cmdsafe"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("cmdsafe"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
