//! Mutation requests and the run's batch accumulator.

use serde::{Deserialize, Serialize};

use crate::error::{GradeSyncError, GradeSyncResult};
use crate::executor::RetryingExecutor;
use crate::sheets::{BatchUpdate, BatchUpdateResponse, SheetId, SheetsTransport};

/// Row and column where every category block starts. Columns A-C hold
/// student identity fields and are never written.
pub const CATEGORY_BLOCK_ROW: u32 = 0;
pub const CATEGORY_BLOCK_COLUMN: u32 = 3;

/// One operation of a `batchUpdate` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    AddSheet(AddSheetRequest),
    PasteData(PasteDataRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddSheetRequest {
    pub properties: NewSheetProperties,
}

impl AddSheetRequest {
    pub fn titled(title: &str) -> Self {
        AddSheetRequest {
            properties: NewSheetProperties {
                title: title.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSheetProperties {
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCoordinate {
    pub sheet_id: SheetId,
    pub row_index: u32,
    pub column_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PasteType {
    #[serde(rename = "PASTE_NORMAL")]
    Normal,
}

/// Paste delimited text into the rectangle anchored at `coordinate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteDataRequest {
    pub coordinate: GridCoordinate,
    pub data: String,
    #[serde(rename = "type")]
    pub paste_type: PasteType,
    pub delimiter: String,
}

/// Build a `pasteData` request for a CSV block. No network effect.
pub fn assemble_request(
    payload_csv: &str,
    sheet_id: SheetId,
    row_index: u32,
    column_index: u32,
) -> Request {
    Request::PasteData(PasteDataRequest {
        coordinate: GridCoordinate {
            sheet_id,
            row_index,
            column_index,
        },
        data: payload_csv.to_string(),
        paste_type: PasteType::Normal,
        delimiter: ",".to_string(),
    })
}

/// CSV for a category block: the header row of column titles, then
/// `roster_size` rows repeating `formula` once per column.
pub fn category_payload(
    columns: &[String],
    formula: &str,
    roster_size: usize,
) -> GradeSyncResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(columns)?;
    let row = vec![formula; columns.len()];
    for _ in 0..roster_size {
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| GradeSyncError::Serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| GradeSyncError::Serialization(e.to_string()))
}

/// Pending mutation requests for the current run.
///
/// Cleared only by a successful [`submit`](Self::submit) or an explicit
/// [`reset`](Self::reset); a failed submission leaves every request in place.
#[derive(Debug, Default)]
pub struct BatchRequestList {
    requests: Vec<Request>,
}

impl BatchRequestList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: Request) {
        self.requests.push(request);
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn reset(&mut self) {
        self.requests.clear();
    }

    /// Submit every pending request as one `batchUpdate` call.
    ///
    /// Returns the number of requests submitted. An empty batch issues no call.
    pub async fn submit<T: SheetsTransport>(
        &mut self,
        executor: &RetryingExecutor<T>,
    ) -> GradeSyncResult<usize> {
        if self.requests.is_empty() {
            log::info!("No pending requests, skipping batch update");
            return Ok(0);
        }

        let count = self.requests.len();
        log::info!("Issuing batch request with {} requests", count);

        let call = BatchUpdate {
            requests: self.requests.clone(),
        };
        let _: BatchUpdateResponse = executor.execute(&call).await?;

        self.requests.clear();
        log::info!("Completed batch request");
        Ok(count)
    }
}
