//! Cell formulas written into category blocks.
//!
//! Both formulas read the column header (row 1 of the current column) as the
//! name of the assignment's raw grade subsheet, then look the student id from
//! column C up in that subsheet. They are positioned, never evaluated.

/// Score lookup: student id in column C, score in column F of the
/// assignment subsheet.
pub const GRADE_RETRIEVAL_FORMULA: &str = r#"=XLOOKUP(C:C, INDIRECT( INDIRECT(ADDRESS(1, COLUMN(), 4)) & "!C:C"), INDIRECT(INDIRECT(ADDRESS(1, COLUMN(), 4)) & "!F:F"))"#;

/// Completion indicator: 0 when the submission status in column H is
/// "Missing", 1 otherwise.
pub const DISCUSSION_COMPLETION_FORMULA: &str = r#"=IF(XLOOKUP($C:$C, INDIRECT(INDIRECT(ADDRESS(1,COLUMN(),4)) & "!C:C"), INDIRECT(INDIRECT(ADDRESS(1,COLUMN(),4)) & "!H:H")) = "Missing", 0, 1)"#;
