//! Grade export parsing.
//!
//! The source exports one CSV per assignment. Only a few columns matter and
//! they sit at fixed offsets of the export format:
//!
//! | index | column           |
//! |-------|------------------|
//! | 2     | student id (SID) |
//! | 5     | score            |
//! | 6     | max points       |
//! | 7     | status           |
//!
//! Rows that don't fit are skipped with a warning instead of failing the run.

use crate::error::{GradeSyncError, GradeSyncResult};

pub const STUDENT_ID_COLUMN: usize = 2;
pub const SCORE_COLUMN: usize = 5;
pub const MAX_POINTS_COLUMN: usize = 6;
pub const STATUS_COLUMN: usize = 7;

/// Status the source reports for an assignment that was never submitted.
pub const MISSING_STATUS: &str = "Missing";

#[derive(Debug, Clone, PartialEq)]
pub struct GradeRow {
    pub student_id: String,
    /// `None` when the submission hasn't been graded.
    pub score: Option<f64>,
    pub max_points: f64,
    pub status: Option<String>,
}

impl GradeRow {
    pub fn is_submitted(&self) -> bool {
        self.status.as_deref() != Some(MISSING_STATUS)
    }
}

/// A validated grade export: header plus the rows that parsed.
#[derive(Debug, Clone, Default)]
pub struct GradeExport {
    header: csv::StringRecord,
    records: Vec<csv::StringRecord>,
    rows: Vec<GradeRow>,
    skipped: usize,
}

impl GradeExport {
    /// Parse an export, skipping rows that can't be read at the fixed offsets.
    pub fn parse(assignment: &str, text: &str) -> GradeSyncResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let header = reader.headers()?.clone();
        let mut export = GradeExport {
            header,
            ..Default::default()
        };

        for (index, result) in reader.records().enumerate() {
            // Row 1 is the header
            let line = index + 2;
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    log::warn!("{}: skipping unreadable row {}: {}", assignment, line, e);
                    export.skipped += 1;
                    continue;
                }
            };

            match parse_row(&record) {
                Ok(row) => {
                    export.rows.push(row);
                    export.records.push(record);
                }
                Err(reason) => {
                    log::warn!("{}: skipping row {}: {}", assignment, line, reason);
                    export.skipped += 1;
                }
            }
        }

        Ok(export)
    }

    pub fn rows(&self) -> &[GradeRow] {
        &self.rows
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn graded_count(&self) -> usize {
        self.rows.iter().filter(|r| r.score.is_some()).count()
    }

    pub fn missing_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_submitted()).count()
    }

    /// Header and valid rows re-serialized as CSV, fields unchanged.
    pub fn to_csv(&self) -> GradeSyncResult<String> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(&self.header)?;
        for record in &self.records {
            writer.write_record(record)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| GradeSyncError::Serialization(e.to_string()))?;
        String::from_utf8(bytes)
            .map_err(|e| GradeSyncError::Serialization(e.to_string()))
    }
}

fn parse_row(record: &csv::StringRecord) -> Result<GradeRow, String> {
    if record.len() <= MAX_POINTS_COLUMN {
        return Err(format!(
            "expected at least {} columns, found {}",
            MAX_POINTS_COLUMN + 1,
            record.len()
        ));
    }

    let student_id = record[STUDENT_ID_COLUMN].trim();
    if student_id.is_empty() {
        return Err("empty student id".to_string());
    }

    let score = match record[SCORE_COLUMN].trim() {
        "" => None,
        s => Some(
            s.parse::<f64>()
                .map_err(|_| format!("score '{s}' is not a number"))?,
        ),
    };

    let max_points = record[MAX_POINTS_COLUMN].trim();
    let max_points = max_points
        .parse::<f64>()
        .map_err(|_| format!("max points '{max_points}' is not a number"))?;

    let status = record
        .get(STATUS_COLUMN)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Ok(GradeRow {
        student_id: student_id.to_string(),
        score,
        max_points,
        status,
    })
}
