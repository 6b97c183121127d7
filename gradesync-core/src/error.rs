//! Error types for gradesync.

use thiserror::Error;

/// Failure reported by a `SheetsTransport` for a single remote call.
///
/// The classification matters: only `RateLimited` is ever retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("rate limited (429): {0}")]
    RateLimited(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The range (or sheet title) named a subsheet that doesn't exist.
    #[error("no subsheet for range {0}")]
    MissingSubsheet(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ApiError::RateLimited(_))
    }
}

/// Errors that can occur in gradesync operations.
#[derive(Error, Debug)]
pub enum GradeSyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Grade source error: {0}")]
    Source(String),

    #[error("Grade source '{0}' not found in PATH")]
    SourceNotInstalled(String),

    #[error("Grade source request timed out after {0}s")]
    SourceTimeout(u64),

    #[error("Sheets API call '{call}' failed: {source}")]
    Api {
        call: String,
        #[source]
        source: ApiError,
    },

    #[error("Sheets API call '{call}' still rate limited after {attempts} attempts")]
    RateLimited { call: String, attempts: u32 },

    #[error("Subsheet '{0}' does not exist")]
    MissingSubsheet(String),

    #[error("Unexpected Sheets API response for '{call}': {message}")]
    UnexpectedResponse { call: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for gradesync operations.
pub type GradeSyncResult<T> = Result<T, GradeSyncError>;
