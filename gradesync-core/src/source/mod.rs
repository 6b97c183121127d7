//! The assessment platform boundary.

pub mod protocol;
pub mod provider;

pub use provider::SourceProvider;

use crate::assignment::AssignmentRecord;
use crate::error::GradeSyncResult;

/// Where assignments and their grade exports come from.
#[allow(async_fn_in_trait)]
pub trait GradeSource {
    async fn list_assignments(&self, course_id: &str) -> GradeSyncResult<Vec<AssignmentRecord>>;

    /// Grade export of one assignment as CSV text.
    async fn fetch_grades(&self, course_id: &str, assignment_id: &str) -> GradeSyncResult<String>;
}
