//! In-memory stand-ins for the Sheets API and the grade source.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use gradesync_core::error::ApiError;
use gradesync_core::request::Request;
use gradesync_core::sheets::{BatchUpdate, Endpoint, SheetId, SheetsTransport};
use gradesync_core::source::GradeSource;
use gradesync_core::{AssignmentRecord, GradeSyncError, GradeSyncResult, RetryPolicy};
use serde_json::{Value, json};

/// Retry policy that never sleeps.
pub fn instant_retries() -> RetryPolicy {
    RetryPolicy {
        base_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
        ..RetryPolicy::default()
    }
}

pub struct FakeSheet {
    pub id: SheetId,
    pub title: String,
    pub cells: Vec<Vec<String>>,
}

impl FakeSheet {
    pub fn header(&self) -> Vec<String> {
        self.cells.first().cloned().unwrap_or_default()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.cells.get(row)?.get(column).map(String::as_str)
    }
}

#[derive(Default)]
struct State {
    sheets: Vec<FakeSheet>,
    next_id: SheetId,
    calls: Vec<Endpoint>,
    batches: Vec<Vec<Request>>,
    /// Listed in metadata but unknown to every other endpoint.
    ghosts: Vec<(SheetId, String)>,
    /// Calls left to answer with 429 before behaving normally.
    throttled: u32,
}

/// A spreadsheet that applies `addSheet` and `pasteData` requests to an
/// in-memory grid, and records every call it receives.
#[derive(Default)]
pub struct FakeSpreadsheet {
    state: Mutex<State>,
}

impl FakeSpreadsheet {
    pub fn new() -> Self {
        FakeSpreadsheet {
            state: Mutex::new(State {
                next_id: 100,
                ..Default::default()
            }),
        }
    }

    /// Add a subsheet whose first row is `header`.
    pub fn with_sheet(self, title: &str, header: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.next_id;
            state.next_id += 1;
            let cells = if header.is_empty() {
                Vec::new()
            } else {
                vec![header.iter().map(|s| s.to_string()).collect()]
            };
            state.sheets.push(FakeSheet {
                id,
                title: title.to_string(),
                cells,
            });
        }
        self
    }

    /// List a subsheet in the metadata that the values and batch endpoints
    /// don't know about, like one deleted after the listing was cached.
    pub fn with_ghost_sheet(self, title: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.next_id;
            state.next_id += 1;
            state.ghosts.push((id, title.to_string()));
        }
        self
    }

    /// Answer the next `count` calls with HTTP 429.
    pub fn throttle(&self, count: u32) {
        self.state.lock().unwrap().throttled = count;
    }

    pub fn calls(&self) -> Vec<Endpoint> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn batches(&self) -> Vec<Vec<Request>> {
        self.state.lock().unwrap().batches.clone()
    }

    /// `pasteData` requests across every batch, in submission order.
    pub fn pastes(&self) -> Vec<gradesync_core::request::PasteDataRequest> {
        self.batches()
            .into_iter()
            .flatten()
            .filter_map(|r| match r {
                Request::PasteData(paste) => Some(paste),
                Request::AddSheet(_) => None,
            })
            .collect()
    }

    /// Titles passed to `addSheet`, in order.
    pub fn added_sheets(&self) -> Vec<String> {
        self.batches()
            .into_iter()
            .flatten()
            .filter_map(|r| match r {
                Request::AddSheet(add) => Some(add.properties.title),
                Request::PasteData(_) => None,
            })
            .collect()
    }

    pub fn sheet_titles(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.sheets.iter().map(|s| s.title.clone()).collect()
    }

    pub fn sheet_id(&self, title: &str) -> Option<SheetId> {
        let state = self.state.lock().unwrap();
        state.sheets.iter().find(|s| s.title == title).map(|s| s.id)
    }

    pub fn header(&self, title: &str) -> Vec<String> {
        self.with(title, FakeSheet::header).unwrap_or_default()
    }

    pub fn cell(&self, title: &str, row: usize, column: usize) -> Option<String> {
        self.with(title, |s| s.cell(row, column).map(str::to_string))
            .flatten()
    }

    fn with<R>(&self, title: &str, f: impl FnOnce(&FakeSheet) -> R) -> Option<R> {
        let state = self.state.lock().unwrap();
        state.sheets.iter().find(|s| s.title == title).map(f)
    }
}

impl State {
    fn metadata(&self) -> Value {
        let sheets: Vec<Value> = self
            .sheets
            .iter()
            .map(|s| (s.id, &s.title))
            .chain(self.ghosts.iter().map(|(id, title)| (*id, title)))
            .map(|(id, title)| json!({ "properties": { "sheetId": id, "title": title, "index": 0 } }))
            .collect();
        json!({ "sheets": sheets })
    }

    fn header_row(&self, range: &str) -> Result<Value, ApiError> {
        let title = range
            .strip_prefix('\'')
            .and_then(|r| r.strip_suffix("'!1:1"))
            .map(|t| t.replace("''", "'"))
            .ok_or_else(|| ApiError::Status {
                status: 400,
                message: format!("bad range {range}"),
            })?;

        let sheet = self
            .sheets
            .iter()
            .find(|s| s.title == title)
            .ok_or_else(|| ApiError::MissingSubsheet(range.to_string()))?;

        // The API omits `values` for an empty row
        let header = sheet.header();
        if header.is_empty() {
            Ok(json!({ "range": range, "majorDimension": "ROWS" }))
        } else {
            Ok(json!({ "range": range, "majorDimension": "ROWS", "values": [header] }))
        }
    }

    fn batch_update(&mut self, body: Option<&Value>) -> Result<Value, ApiError> {
        let batch: BatchUpdate = body
            .cloned()
            .and_then(|b| serde_json::from_value(b).ok())
            .ok_or_else(|| ApiError::Status {
                status: 400,
                message: "malformed batchUpdate body".to_string(),
            })?;

        let mut replies = Vec::new();
        for request in &batch.requests {
            match request {
                Request::AddSheet(add) => {
                    let title = &add.properties.title;
                    if self.sheets.iter().any(|s| &s.title == title) {
                        return Err(ApiError::Status {
                            status: 400,
                            message: format!("A sheet with the name \"{title}\" already exists"),
                        });
                    }
                    let id = self.next_id;
                    self.next_id += 1;
                    self.sheets.push(FakeSheet {
                        id,
                        title: title.clone(),
                        cells: Vec::new(),
                    });
                    replies.push(json!({ "addSheet": { "properties": { "sheetId": id, "title": title } } }));
                }
                Request::PasteData(paste) => {
                    let sheet = self
                        .sheets
                        .iter_mut()
                        .find(|s| s.id == paste.coordinate.sheet_id)
                        .ok_or_else(|| ApiError::Status {
                            status: 400,
                            message: format!("No grid with id: {}", paste.coordinate.sheet_id),
                        })?;
                    paste_csv(
                        &mut sheet.cells,
                        &paste.data,
                        paste.coordinate.row_index as usize,
                        paste.coordinate.column_index as usize,
                    );
                    replies.push(json!({}));
                }
            }
        }

        self.batches.push(batch.requests);
        Ok(json!({ "spreadsheetId": "fake", "replies": replies }))
    }
}

fn paste_csv(cells: &mut Vec<Vec<String>>, data: &str, row: usize, column: usize) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_bytes());

    for (offset, record) in reader.records().enumerate() {
        let record = record.expect("paste payload is valid CSV");
        let r = row + offset;
        if cells.len() <= r {
            cells.resize(r + 1, Vec::new());
        }
        let target = &mut cells[r];
        if target.len() < column + record.len() {
            target.resize(column + record.len(), String::new());
        }
        for (i, field) in record.iter().enumerate() {
            target[column + i] = field.to_string();
        }
    }
}

impl SheetsTransport for FakeSpreadsheet {
    async fn send(&self, endpoint: &Endpoint, body: Option<&Value>) -> Result<Value, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(endpoint.clone());

        if state.throttled > 0 {
            state.throttled -= 1;
            return Err(ApiError::RateLimited("Quota exceeded".to_string()));
        }

        match endpoint {
            Endpoint::Spreadsheet { .. } => Ok(state.metadata()),
            Endpoint::Values { range } => state.header_row(range),
            Endpoint::BatchUpdate => state.batch_update(body),
        }
    }
}

/// A grade source backed by fixed data.
#[derive(Default)]
pub struct FakeSource {
    pub assignments: Vec<AssignmentRecord>,
    pub exports: HashMap<String, String>,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new(titles: &[(&str, &str)]) -> Self {
        FakeSource {
            assignments: titles
                .iter()
                .map(|(id, title)| AssignmentRecord::new(*id, *title))
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_export(mut self, assignment_id: &str, csv: &str) -> Self {
        self.exports.insert(assignment_id.to_string(), csv.to_string());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl GradeSource for FakeSource {
    async fn list_assignments(&self, _course_id: &str) -> GradeSyncResult<Vec<AssignmentRecord>> {
        Ok(self.assignments.clone())
    }

    async fn fetch_grades(&self, _course_id: &str, assignment_id: &str) -> GradeSyncResult<String> {
        self.fetched.lock().unwrap().push(assignment_id.to_string());
        self.exports
            .get(assignment_id)
            .cloned()
            .ok_or_else(|| GradeSyncError::Source(format!("no export for {assignment_id}")))
    }
}
