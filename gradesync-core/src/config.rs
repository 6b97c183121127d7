//! Configuration at ~/.config/gradesync/config.toml

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GradeSyncError, GradeSyncResult};
use crate::executor::{DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use crate::source::SourceProvider;
use crate::sync::SyncOptions;

const DEFAULT_ROSTER_SIZE: usize = 180;
const DEFAULT_SOURCE: &str = "gradescope";
const DEFAULT_ACCESS_TOKEN_ENV: &str = "GRADESYNC_ACCESS_TOKEN";

fn default_roster_size() -> usize {
    DEFAULT_ROSTER_SIZE
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_access_token_env() -> String {
    DEFAULT_ACCESS_TOKEN_ENV.to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetryConfig {
    #[serde(default = "RetryConfig::default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "RetryConfig::default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "RetryConfig::default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl RetryConfig {
    fn default_max_attempts() -> u32 {
        DEFAULT_MAX_ATTEMPTS
    }

    fn default_base_delay_ms() -> u64 {
        1_000
    }

    fn default_max_delay_ms() -> u64 {
        60_000
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: Self::default_max_attempts(),
            base_delay_ms: Self::default_base_delay_ms(),
            max_delay_ms: Self::default_max_delay_ms(),
        }
    }
}

/// Everything a run needs besides the access token itself.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SyncConfig {
    pub course_id: Option<String>,

    pub spreadsheet_id: Option<String>,

    #[serde(default = "default_roster_size")]
    pub roster_size: usize,

    /// Name of the grade source; resolved to `gradesync-source-<name>`.
    #[serde(default = "default_source")]
    pub source: String,

    #[serde(default = "default_true")]
    pub mirror_grades: bool,

    /// Environment variable holding the Sheets bearer token.
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,

    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            course_id: None,
            spreadsheet_id: None,
            roster_size: DEFAULT_ROSTER_SIZE,
            source: default_source(),
            mirror_grades: true,
            access_token_env: default_access_token_env(),
            retry: RetryConfig::default(),
        }
    }
}

impl SyncConfig {
    pub fn config_path() -> GradeSyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| GradeSyncError::Config("Could not determine config directory".into()))?
            .join("gradesync");

        Ok(config_dir.join("config.toml"))
    }

    /// Read and parse the config file at `path`.
    pub fn load(path: &Path) -> GradeSyncResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GradeSyncError::Config(format!("Could not read {}: {e}", path.display()))
        })?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> GradeSyncResult<Self> {
        toml::from_str(content).map_err(|e| GradeSyncError::Config(e.to_string()))
    }

    /// Create a default config file with the optional settings commented out.
    pub fn create_default_config(path: &Path) -> GradeSyncResult<()> {
        let contents = format!(
            "\
# gradesync configuration

# Course on the assessment platform:
course_id = \"\"

# Spreadsheet that receives the grades (the id in its URL):
spreadsheet_id = \"\"

# Formula rows written under each assignment column:
# roster_size = {DEFAULT_ROSTER_SIZE}

# Grade source binary, resolved as gradesync-source-<name>:
# source = \"{DEFAULT_SOURCE}\"

# Copy each assignment's grade export into its own subsheet:
# mirror_grades = true

# Environment variable holding the Sheets access token:
# access_token_env = \"{DEFAULT_ACCESS_TOKEN_ENV}\"

# [retry]
# max_attempts = {DEFAULT_MAX_ATTEMPTS}
# base_delay_ms = 1000
# max_delay_ms = 60000
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GradeSyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| GradeSyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn course_id(&self) -> GradeSyncResult<&str> {
        required(&self.course_id, "course_id")
    }

    pub fn spreadsheet_id(&self) -> GradeSyncResult<&str> {
        required(&self.spreadsheet_id, "spreadsheet_id")
    }

    pub fn source_provider(&self) -> SourceProvider {
        SourceProvider::from_name(&self.source)
    }

    /// Read the access token from the configured environment variable.
    pub fn access_token(&self) -> GradeSyncResult<String> {
        match std::env::var(&self.access_token_env) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(GradeSyncError::Config(format!(
                "No access token: set {}",
                self.access_token_env
            ))),
        }
    }

    pub fn retry_policy(&self) -> GradeSyncResult<RetryPolicy> {
        if self.retry.max_attempts == 0 {
            return Err(GradeSyncError::Config(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        Ok(RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            ..RetryPolicy::default()
        })
    }

    pub fn sync_options(&self) -> GradeSyncResult<SyncOptions> {
        Ok(SyncOptions {
            course_id: self.course_id()?.to_string(),
            roster_size: self.roster_size,
            mirror_grades: self.mirror_grades,
        })
    }
}

fn required<'a>(value: &'a Option<String>, key: &str) -> GradeSyncResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GradeSyncError::Config(format!("'{key}' is not set")))
}
