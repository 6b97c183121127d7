//! Core of gradesync: mirrors assessment-platform assignments into a Google
//! Sheets gradebook.
//!
//! - `classify` buckets assignment titles into categories and orders them
//! - `columns` diffs a category's desired columns against its subsheet header
//! - `request` builds `pasteData` requests and the pending batch
//! - `executor` retries rate-limited Sheets calls with exponential backoff
//! - `sync` runs the whole pipeline against a `SyncSession`

pub mod assignment;
pub mod classify;
pub mod columns;
pub mod config;
pub mod directory;
pub mod error;
pub mod executor;
pub mod formula;
pub mod grades;
pub mod request;
pub mod session;
pub mod sheets;
pub mod source;
pub mod sync;

pub use assignment::AssignmentRecord;
pub use classify::Category;
pub use columns::ColumnDiff;
pub use config::SyncConfig;
pub use error::{ApiError, GradeSyncError, GradeSyncResult};
pub use executor::{RetryPolicy, RetryingExecutor};
pub use session::SyncSession;
pub use sync::{SyncOptions, SyncPlan, SyncReport};
