pub mod assignments;
pub mod config;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gradesync_core::SyncConfig;
use gradesync_core::SyncSession;
use gradesync_core::sheets::GoogleSheetsClient;

/// `--config` if given, otherwise the default location.
pub fn config_path(override_path: Option<&Path>) -> Result<PathBuf> {
    match override_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(SyncConfig::config_path()?),
    }
}

pub fn load_config(override_path: Option<&Path>) -> Result<SyncConfig> {
    let path = config_path(override_path)?;

    if !path.exists() {
        anyhow::bail!(
            "No config found at {}.\n\n\
            Create one with:\n  \
            gradesync config",
            path.display()
        );
    }

    SyncConfig::load(&path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Session against the configured spreadsheet, with the configured retry policy.
pub fn open_session(config: &SyncConfig) -> Result<SyncSession<GoogleSheetsClient>> {
    let client = GoogleSheetsClient::new(config.spreadsheet_id()?, &config.access_token()?)?;
    Ok(SyncSession::new(client, config.retry_policy()?))
}
