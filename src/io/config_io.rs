use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::SyncConfig;

/// Name of the config file at the vault root
pub const CONFIG_FILE: &str = ".tasklink.toml";

/// Error type for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{0} already exists (use --force to overwrite)")]
    AlreadyExists(PathBuf),
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub const CONFIG_TEMPLATE: &str = r###"# tasklink configuration

[aggregator]
# Daily notes live in <folder>/<format>.md
folder = "Daily"
format = "%Y-%m-%d"
# New tasks are inserted directly below this heading. The section is never created.
heading = "## Tasks"

[scan]
include_elevated = true   # 🔺
include_standard = true   # ⏫
# Maximum tasks per full scan (0 = unlimited)
max_results = 200

[exclude]
# The daily notes folder is always left out of source scans
folders = ["Templates"]
paths = []
basenames = []

[sync]
# Quiet period before a burst of edits is processed (200..10000)
debounce_ms = 1500
"###;

/// Resolve which config file applies: an explicit path, or the vault default.
pub fn config_path(vault_root: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => vault_root.join(CONFIG_FILE),
    }
}

/// Read the config. A missing default config yields the defaults; a missing
/// explicit config is an error.
pub fn read_config(vault_root: &Path, explicit: Option<&Path>) -> Result<SyncConfig, ConfigError> {
    let path = config_path(vault_root, explicit);
    if explicit.is_none() && !path.exists() {
        return Ok(SyncConfig::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::ParseError { path, source: e })
}

/// Write the commented config template into the vault.
pub fn write_default_config(vault_root: &Path, force: bool) -> Result<PathBuf, ConfigError> {
    let path = vault_root.join(CONFIG_FILE);
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path));
    }
    fs::write(&path, CONFIG_TEMPLATE).map_err(|e| ConfigError::WriteError {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}
