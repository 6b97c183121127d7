//! Column diffing for category subsheets.

use std::collections::HashSet;

use serde::Serialize;

use crate::classify::{Category, sort_titles};
use crate::directory::SubsheetDirectory;
use crate::error::{ApiError, GradeSyncError, GradeSyncResult};
use crate::executor::RetryingExecutor;
use crate::sheets::{ReadHeaderRow, SheetsTransport};

/// Header cells before this index (columns A-C) are student identity fields.
pub const RESERVED_COLUMNS: usize = 3;

/// Column layout of one category block: the columns already on the sheet,
/// in their original order, followed by the columns to add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDiff {
    pub category: Category,
    pub existing: Vec<String>,
    pub added: Vec<String>,
}

impl ColumnDiff {
    /// Full column sequence: existing ++ added.
    pub fn columns(&self) -> Vec<String> {
        self.existing.iter().chain(&self.added).cloned().collect()
    }

    pub fn has_changes(&self) -> bool {
        !self.added.is_empty()
    }
}

/// Append the assignment titles not yet present after the existing columns.
///
/// New titles are ordered by ordering key, then title. Existing columns are
/// never reordered or dropped, even when no assignment refers to them.
pub fn diff<'a>(
    category: Category,
    assignment_titles: impl IntoIterator<Item = &'a str>,
    existing_columns: &[String],
) -> ColumnDiff {
    let existing: HashSet<&str> = existing_columns.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();

    let mut added: Vec<String> = assignment_titles
        .into_iter()
        .filter(|title| !existing.contains(title) && seen.insert(*title))
        .map(str::to_string)
        .collect();
    sort_titles(&mut added);

    ColumnDiff {
        category,
        existing: existing_columns.to_vec(),
        added,
    }
}

/// Header cells after the reserved columns, without trailing blanks.
pub fn existing_columns_from_header(header: &[String]) -> Vec<String> {
    let mut columns: Vec<String> = header.iter().skip(RESERVED_COLUMNS).cloned().collect();
    while columns.last().is_some_and(|c| c.trim().is_empty()) {
        columns.pop();
    }
    columns
}

/// Read the existing columns of `category`'s subsheet.
///
/// Fails with [`GradeSyncError::MissingSubsheet`] when the subsheet doesn't
/// exist. That is detected from the directory without a call, or from the
/// API rejecting the range, in which case the stale directory entry is
/// dropped so the subsheet can be created again. An existing sheet with an empty header row
/// yields an empty list.
pub async fn read_existing_columns<T: SheetsTransport>(
    executor: &RetryingExecutor<T>,
    directory: &mut SubsheetDirectory,
    category: Category,
) -> GradeSyncResult<Vec<String>> {
    let title = category.sheet_title();
    directory.load(executor).await?;
    if !directory.contains(title) {
        return Err(GradeSyncError::MissingSubsheet(title.to_string()));
    }

    match executor.execute(&ReadHeaderRow::new(title)).await {
        Ok(range) => {
            let header = range.values.into_iter().next().unwrap_or_default();
            Ok(existing_columns_from_header(&header))
        }
        Err(GradeSyncError::Api {
            source: ApiError::MissingSubsheet(_),
            ..
        }) => {
            log::warn!("Subsheet '{}' is listed but its range was rejected", title);
            directory.forget(title);
            Err(GradeSyncError::MissingSubsheet(title.to_string()))
        }
        Err(e) => Err(e),
    }
}
