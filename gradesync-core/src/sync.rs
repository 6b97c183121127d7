//! One synchronization run, and its read-only preview.
//!
//! A run makes a bounded number of Sheets calls: one directory listing, one
//! header read per non-empty category, one `addSheet` per subsheet that
//! doesn't exist yet, and a single batch update carrying every paste.

use std::collections::HashSet;

use serde::Serialize;

use crate::assignment::AssignmentRecord;
use crate::classify::{self, Category};
use crate::columns::{self, ColumnDiff};
use crate::error::{GradeSyncError, GradeSyncResult};
use crate::grades::GradeExport;
use crate::request::{CATEGORY_BLOCK_COLUMN, CATEGORY_BLOCK_ROW, category_payload};
use crate::session::SyncSession;
use crate::sheets::SheetsTransport;
use crate::source::GradeSource;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub course_id: String,
    /// Formula rows written under each column.
    pub roster_size: usize,
    /// Copy each assignment's grade export into a subsheet named after it.
    pub mirror_grades: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub assignments: usize,
    pub categories: Vec<ColumnDiff>,
    pub mirrored: usize,
    pub skipped_rows: usize,
    pub created_sheets: Vec<String>,
    pub requests_submitted: usize,
    pub retries: u32,
}

impl SyncReport {
    pub fn added_columns(&self) -> usize {
        self.categories.iter().map(|d| d.added.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryPlan {
    pub diff: ColumnDiff,
    pub sheet_exists: bool,
}

/// What a run would do, computed without writing anything.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncPlan {
    pub assignments: usize,
    pub categories: Vec<CategoryPlan>,
    /// Assignment subsheets a run would create when mirroring grades.
    pub missing_assignment_sheets: Vec<String>,
}

/// Synchronize every classified assignment into the spreadsheet.
///
/// Resets `session` first. On any failure the run aborts; nothing queued in
/// the batch has been written at that point.
pub async fn run<S: GradeSource, T: SheetsTransport>(
    session: &mut SyncSession<T>,
    source: &S,
    options: &SyncOptions,
) -> GradeSyncResult<SyncReport> {
    session.reset();

    let assignments = source.list_assignments(&options.course_id).await?;
    log::info!("Found {} assignments", assignments.len());
    let buckets = classify::bucket(&assignments);

    session.load_directory().await?;

    let mut report = SyncReport {
        assignments: assignments.len(),
        ..Default::default()
    };

    if options.mirror_grades {
        for record in mirrored_assignments(&assignments) {
            report.skipped_rows += mirror_assignment(session, source, options, record).await?;
            report.mirrored += 1;
        }
    }

    for (category, records) in &buckets {
        let diff = diff_category(session, *category, records).await?;
        log::info!(
            "{}: {} existing columns, {} new",
            category,
            diff.existing.len(),
            diff.added.len()
        );

        let sheet_id = session.get_or_create_sheet_id(category.sheet_title()).await?;
        let payload = category_payload(&diff.columns(), category.formula(), options.roster_size)?;
        session.assemble_request(&payload, sheet_id, CATEGORY_BLOCK_ROW, CATEGORY_BLOCK_COLUMN);

        report.categories.push(diff);
    }

    report.requests_submitted = session.submit().await?;
    report.created_sheets = session.directory().created().to_vec();
    report.retries = session.executor().retry_count();

    Ok(report)
}

/// Compute the column diffs a run would apply, without creating subsheets or
/// writing anything.
pub async fn plan<S: GradeSource, T: SheetsTransport>(
    session: &mut SyncSession<T>,
    source: &S,
    options: &SyncOptions,
) -> GradeSyncResult<SyncPlan> {
    session.reset();

    let assignments = source.list_assignments(&options.course_id).await?;
    let buckets = classify::bucket(&assignments);
    session.load_directory().await?;

    let mut plan = SyncPlan {
        assignments: assignments.len(),
        ..Default::default()
    };

    if options.mirror_grades {
        plan.missing_assignment_sheets = mirrored_assignments(&assignments)
            .filter(|r| !session.directory().contains(&r.title))
            .map(|r| r.title.clone())
            .collect();
    }

    for (category, records) in &buckets {
        let (existing, sheet_exists) = match session.read_existing_columns(*category).await {
            Ok(existing) => (existing, true),
            Err(GradeSyncError::MissingSubsheet(_)) => (Vec::new(), false),
            Err(e) => return Err(e),
        };
        let diff = columns::diff(*category, titles(records), &existing);
        plan.categories.push(CategoryPlan { diff, sheet_exists });
    }

    Ok(plan)
}

/// Diff one category against its subsheet, creating the subsheet when it
/// doesn't exist yet.
async fn diff_category<T: SheetsTransport>(
    session: &mut SyncSession<T>,
    category: Category,
    records: &[AssignmentRecord],
) -> GradeSyncResult<ColumnDiff> {
    let existing = match session.read_existing_columns(category).await {
        Ok(existing) => existing,
        Err(GradeSyncError::MissingSubsheet(title)) => {
            log::info!("Subsheet '{}' is missing, creating it", title);
            session.get_or_create_sheet_id(&title).await?;
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    Ok(columns::diff(category, titles(records), &existing))
}

/// Fetch, validate and queue one assignment's grade export. Returns the
/// number of rows skipped.
async fn mirror_assignment<S: GradeSource, T: SheetsTransport>(
    session: &mut SyncSession<T>,
    source: &S,
    options: &SyncOptions,
    record: &AssignmentRecord,
) -> GradeSyncResult<usize> {
    let text = source.fetch_grades(&options.course_id, &record.id).await?;
    let export = GradeExport::parse(&record.title, &text)?;
    log::info!(
        "{}: {} students, {} graded, {} missing",
        record.title,
        export.rows().len(),
        export.graded_count(),
        export.missing_count()
    );

    let sheet_id = session.get_or_create_sheet_id(&record.title).await?;
    session.assemble_request(&export.to_csv()?, sheet_id, 0, 0);
    log::info!("Created sheets request for {}", record.title);

    Ok(export.skipped())
}

/// Classified assignments whose grades get their own subsheet, one per
/// title. Titles that collide with a category subsheet are left out so a
/// grade export never overwrites a category block.
fn mirrored_assignments(assignments: &[AssignmentRecord]) -> impl Iterator<Item = &AssignmentRecord> {
    let category_titles: HashSet<&str> = Category::ALL.iter().map(|c| c.sheet_title()).collect();
    let mut seen = HashSet::new();

    assignments.iter().filter(move |record| {
        if classify::matching_categories(&record.title).is_empty() {
            return false;
        }
        if category_titles.contains(record.title.as_str()) {
            log::warn!(
                "Not mirroring '{}': the title is reserved for a category subsheet",
                record.title
            );
            return false;
        }
        seen.insert(record.title.clone())
    })
}

fn titles(records: &[AssignmentRecord]) -> impl Iterator<Item = &str> {
    records.iter().map(|r| r.title.as_str())
}

