//! Typed calls against the Sheets v4 REST API.
//!
//! Each call names its endpoint and the response type it deserializes to,
//! so the executor can stay generic over transports.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{GradeSyncError, GradeSyncResult};
use crate::request::{AddSheetRequest, Request};
use crate::sheets::Endpoint;

/// Remote numeric identifier of a subsheet.
pub type SheetId = i64;

pub trait SheetsCall {
    type Response: DeserializeOwned;

    fn endpoint(&self) -> Endpoint;

    /// JSON body, for calls that send one.
    fn body(&self) -> GradeSyncResult<Option<serde_json::Value>> {
        Ok(None)
    }

    /// Short human-readable description used in logs and errors.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub sheet_id: SheetId,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpreadsheetMetadata {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

/// List the properties of every subsheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListSheets;

impl SheetsCall for ListSheets {
    type Response = SpreadsheetMetadata;

    fn endpoint(&self) -> Endpoint {
        Endpoint::Spreadsheet {
            fields: "sheets.properties".to_string(),
        }
    }

    fn describe(&self) -> String {
        "list subsheets".to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

/// Read row 1 of one subsheet.
#[derive(Debug, Clone)]
pub struct ReadHeaderRow {
    pub sheet_title: String,
}

impl ReadHeaderRow {
    pub fn new(sheet_title: impl Into<String>) -> Self {
        ReadHeaderRow {
            sheet_title: sheet_title.into(),
        }
    }

    /// A1 range covering the first row, e.g. `'Lecture Quizzes'!1:1`.
    pub fn range(&self) -> String {
        format!("'{}'!1:1", self.sheet_title.replace('\'', "''"))
    }
}

impl SheetsCall for ReadHeaderRow {
    type Response = ValueRange;

    fn endpoint(&self) -> Endpoint {
        Endpoint::Values {
            range: self.range(),
        }
    }

    fn describe(&self) -> String {
        format!("read header row of '{}'", self.sheet_title)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSheetReply {
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_sheet: Option<AddSheetReply>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub replies: Vec<Reply>,
}

/// Apply a list of mutation requests atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchUpdate {
    pub requests: Vec<Request>,
}

impl BatchUpdate {
    /// A batch holding a single `addSheet` request.
    pub fn add_sheet(title: &str) -> Self {
        BatchUpdate {
            requests: vec![Request::AddSheet(AddSheetRequest::titled(title))],
        }
    }
}

impl SheetsCall for BatchUpdate {
    type Response = BatchUpdateResponse;

    fn endpoint(&self) -> Endpoint {
        Endpoint::BatchUpdate
    }

    fn body(&self) -> GradeSyncResult<Option<serde_json::Value>> {
        serde_json::to_value(self)
            .map(Some)
            .map_err(|e| GradeSyncError::Serialization(e.to_string()))
    }

    fn describe(&self) -> String {
        match self.requests.as_slice() {
            [Request::AddSheet(add)] => format!("create subsheet '{}'", add.properties.title),
            requests => format!("batch update ({} requests)", requests.len()),
        }
    }
}
