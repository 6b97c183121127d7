mod support;

use gradesync_core::classify::Category;
use gradesync_core::formula::{DISCUSSION_COMPLETION_FORMULA, GRADE_RETRIEVAL_FORMULA};
use gradesync_core::sheets::Endpoint;
use gradesync_core::{GradeSyncError, SyncOptions, SyncSession, sync};
use pretty_assertions::assert_eq;

use support::{FakeSource, FakeSpreadsheet, instant_retries};

const LAB_EXPORT: &str = "\
First Name,Last Name,SID,Email,Sections,Total Score,Max Points,Status
Ada,Lovelace,3031001,ada@example.edu,101,9.5,10.0,Graded
Alan,Turing,3031002,alan@example.edu,101,,10.0,Missing
Grace,Hopper,,grace@example.edu,102,10.0,10.0,Graded
";

fn options(mirror_grades: bool) -> SyncOptions {
    SyncOptions {
        course_id: "831412".to_string(),
        roster_size: 2,
        mirror_grades,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn batch_calls(calls: &[Endpoint]) -> usize {
    calls.iter().filter(|c| **c == Endpoint::BatchUpdate).count()
}

#[tokio::test]
async fn test_first_run_creates_subsheets_and_submits_one_batch() {
    let sheets = FakeSpreadsheet::new();
    let source = FakeSource::new(&[("1", "Lab 1"), ("2", "Project 2")]);
    let mut session = SyncSession::new(&sheets, instant_retries());

    let report = sync::run(&mut session, &source, &options(false)).await.unwrap();

    assert_eq!(sheets.added_sheets(), strings(&["Labs", "Projects"]));
    assert_eq!(report.created_sheets, strings(&["Labs", "Projects"]));

    assert_eq!(report.categories.len(), 2);
    assert_eq!(report.categories[0].category, Category::Labs);
    assert_eq!(report.categories[0].added, strings(&["Lab 1"]));
    assert_eq!(report.categories[1].category, Category::Projects);
    assert_eq!(report.categories[1].added, strings(&["Project 2"]));

    // Two addSheet calls, then every paste in a single batch
    let batches = sheets.batches();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[2].len(), 2);
    assert_eq!(report.requests_submitted, 2);

    let pastes = sheets.pastes();
    let labs = sheets.sheet_id("Labs").unwrap();
    let projects = sheets.sheet_id("Projects").unwrap();
    assert_eq!(pastes[0].coordinate.sheet_id, labs);
    assert_eq!(pastes[1].coordinate.sheet_id, projects);
    assert_ne!(labs, projects);
    for paste in &pastes {
        assert_eq!(paste.coordinate.row_index, 0);
        assert_eq!(paste.coordinate.column_index, 3);
    }

    assert!(session.batch().is_empty());
    assert!(source.fetched().is_empty());
    assert_eq!(report.retries, 0);
}

#[tokio::test]
async fn test_category_blocks_carry_header_and_formulas() {
    let sheets = FakeSpreadsheet::new();
    let source = FakeSource::new(&[("1", "Lab 1"), ("2", "Discussion 2")]);
    let mut session = SyncSession::new(&sheets, instant_retries());

    sync::run(&mut session, &source, &options(false)).await.unwrap();

    assert_eq!(sheets.header("Labs"), strings(&["", "", "", "Lab 1"]));
    assert_eq!(sheets.cell("Labs", 1, 3).as_deref(), Some(GRADE_RETRIEVAL_FORMULA));
    assert_eq!(sheets.cell("Labs", 2, 3).as_deref(), Some(GRADE_RETRIEVAL_FORMULA));
    assert_eq!(sheets.cell("Labs", 3, 3), None);
    assert_eq!(
        sheets.cell("Discussions", 1, 3).as_deref(),
        Some(DISCUSSION_COMPLETION_FORMULA)
    );
}

#[tokio::test]
async fn test_second_run_adds_nothing() {
    let sheets = FakeSpreadsheet::new();
    let source = FakeSource::new(&[("1", "Lab 1"), ("2", "Discussion 2")]);
    let mut session = SyncSession::new(&sheets, instant_retries());

    sync::run(&mut session, &source, &options(false)).await.unwrap();
    let calls_before = sheets.calls().len();

    let report = sync::run(&mut session, &source, &options(false)).await.unwrap();

    assert_eq!(report.added_columns(), 0);
    assert!(report.created_sheets.is_empty());
    assert_eq!(report.categories[0].existing, strings(&["Lab 1"]));
    assert_eq!(sheets.sheet_titles(), strings(&["Labs", "Discussions"]));
    assert_eq!(sheets.header("Labs"), strings(&["", "", "", "Lab 1"]));

    // Directory listing, two header reads and the batch
    let second_run = &sheets.calls()[calls_before..];
    assert_eq!(second_run.len(), 4);
    assert!(matches!(second_run[0], Endpoint::Spreadsheet { .. }));
    assert_eq!(
        second_run[1],
        Endpoint::Values {
            range: "'Labs'!1:1".to_string()
        }
    );
    assert_eq!(batch_calls(second_run), 1);
}

#[tokio::test]
async fn test_existing_columns_keep_their_order() {
    let sheets = FakeSpreadsheet::new().with_sheet(
        "Labs",
        &["SID", "Name", "Email", "Lab 2", "Lab 10"],
    );
    let source = FakeSource::new(&[
        ("1", "Lab 3"),
        ("2", "Lab 10"),
        ("3", "Lab 1"),
        ("4", "Lab 4 (Optional)"),
        ("5", "Welcome Survey"),
        ("6", "Lab 2"),
    ]);
    let mut session = SyncSession::new(&sheets, instant_retries());

    let report = sync::run(&mut session, &source, &options(false)).await.unwrap();

    assert_eq!(report.categories.len(), 1);
    let diff = &report.categories[0];
    assert_eq!(diff.existing, strings(&["Lab 2", "Lab 10"]));
    assert_eq!(diff.added, strings(&["Lab 1", "Lab 3"]));

    assert!(sheets.added_sheets().is_empty());
    assert_eq!(
        sheets.header("Labs"),
        strings(&["SID", "Name", "Email", "Lab 2", "Lab 10", "Lab 1", "Lab 3"])
    );
}

#[tokio::test]
async fn test_listed_sheet_with_rejected_range_is_recreated() {
    let sheets = FakeSpreadsheet::new().with_ghost_sheet("Labs");
    let ghost_id = 100;
    let source = FakeSource::new(&[("1", "Lab 1")]);
    let mut session = SyncSession::new(&sheets, instant_retries());

    let report = sync::run(&mut session, &source, &options(false)).await.unwrap();

    assert_eq!(sheets.added_sheets(), strings(&["Labs"]));
    assert_eq!(report.created_sheets, strings(&["Labs"]));
    assert_eq!(report.categories[0].added, strings(&["Lab 1"]));

    let labs = sheets.sheet_id("Labs").unwrap();
    assert_ne!(labs, ghost_id);
    let pastes = sheets.pastes();
    assert_eq!(pastes.len(), 1);
    assert_eq!(pastes[0].coordinate.sheet_id, labs);
    assert_eq!(sheets.header("Labs"), strings(&["", "", "", "Lab 1"]));
}

#[tokio::test]
async fn test_mirroring_copies_grade_exports() {
    let sheets = FakeSpreadsheet::new();
    let source = FakeSource::new(&[("11", "Lab 1"), ("12", "Welcome Survey")])
        .with_export("11", LAB_EXPORT);
    let mut session = SyncSession::new(&sheets, instant_retries());

    let report = sync::run(&mut session, &source, &options(true)).await.unwrap();

    // Unclassified assignments aren't fetched
    assert_eq!(source.fetched(), strings(&["11"]));
    assert_eq!(report.mirrored, 1);
    assert_eq!(report.skipped_rows, 1);
    assert_eq!(report.created_sheets, strings(&["Lab 1", "Labs"]));

    let pastes = sheets.pastes();
    assert_eq!(pastes.len(), 2);
    assert_eq!(pastes[0].coordinate.sheet_id, sheets.sheet_id("Lab 1").unwrap());
    assert_eq!(pastes[0].coordinate.column_index, 0);

    assert_eq!(sheets.cell("Lab 1", 0, 2).as_deref(), Some("SID"));
    assert_eq!(sheets.cell("Lab 1", 1, 2).as_deref(), Some("3031001"));
    assert_eq!(sheets.cell("Lab 1", 2, 7).as_deref(), Some("Missing"));
    assert_eq!(sheets.cell("Lab 1", 3, 0), None);
}

#[tokio::test]
async fn test_transient_rate_limits_are_retried() {
    let sheets = FakeSpreadsheet::new().with_sheet("Labs", &["SID", "Name", "Email"]);
    let source = FakeSource::new(&[("1", "Lab 1")]);
    let mut session = SyncSession::new(&sheets, instant_retries());
    sheets.throttle(2);

    let report = sync::run(&mut session, &source, &options(false)).await.unwrap();

    assert_eq!(report.retries, 2);
    assert_eq!(report.categories[0].added, strings(&["Lab 1"]));
    assert_eq!(sheets.pastes().len(), 1);
}

#[tokio::test]
async fn test_persistent_rate_limit_aborts_the_run() {
    let sheets = FakeSpreadsheet::new();
    let source = FakeSource::new(&[("1", "Lab 1")]);
    let mut session = SyncSession::new(&sheets, instant_retries());
    sheets.throttle(u32::MAX);

    let err = sync::run(&mut session, &source, &options(false)).await.unwrap_err();

    assert!(matches!(err, GradeSyncError::RateLimited { attempts: 5, .. }));
    assert_eq!(sheets.calls().len(), 5);
    assert!(sheets.batches().is_empty());
    assert_eq!(session.executor().retry_count(), 4);
}

#[tokio::test]
async fn test_no_classified_assignments_makes_no_writes() {
    let sheets = FakeSpreadsheet::new();
    let source = FakeSource::new(&[("1", "Welcome Survey"), ("2", "Lab 0 (optional)")]);
    let mut session = SyncSession::new(&sheets, instant_retries());

    let report = sync::run(&mut session, &source, &options(true)).await.unwrap();

    assert!(report.categories.is_empty());
    assert_eq!(report.requests_submitted, 0);
    assert_eq!(batch_calls(&sheets.calls()), 0);
}

#[tokio::test]
async fn test_plan_is_read_only() {
    let sheets = FakeSpreadsheet::new().with_sheet("Labs", &["SID", "Name", "Email", "Lab 1"]);
    let source = FakeSource::new(&[("1", "Lab 1"), ("2", "Lab 2"), ("3", "Discussion 1")]);
    let mut session = SyncSession::new(&sheets, instant_retries());

    let plan = sync::plan(&mut session, &source, &options(true)).await.unwrap();

    assert_eq!(plan.assignments, 3);
    assert_eq!(plan.categories.len(), 2);
    assert!(plan.categories[0].sheet_exists);
    assert_eq!(plan.categories[0].diff.added, strings(&["Lab 2"]));
    assert!(!plan.categories[1].sheet_exists);
    assert_eq!(plan.categories[1].diff.added, strings(&["Discussion 1"]));
    assert_eq!(
        plan.missing_assignment_sheets,
        strings(&["Lab 1", "Lab 2", "Discussion 1"])
    );

    assert_eq!(batch_calls(&sheets.calls()), 0);
    assert!(source.fetched().is_empty());
    assert!(session.batch().is_empty());
}
