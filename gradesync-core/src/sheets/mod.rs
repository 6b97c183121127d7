//! The remote spreadsheet boundary.
//!
//! `SheetsTransport` moves raw JSON for one endpoint and classifies failures;
//! everything typed lives in [`protocol`], and retrying lives in the executor.

pub mod http;
pub mod protocol;

pub use http::GoogleSheetsClient;
pub use protocol::{
    BatchUpdate, BatchUpdateResponse, ListSheets, ReadHeaderRow, SheetId, SheetProperties,
    SheetsCall, SpreadsheetMetadata, ValueRange,
};

use crate::error::ApiError;

/// Remote endpoint a call is addressed to, relative to the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET spreadsheets/{id}?fields=...`
    Spreadsheet { fields: String },
    /// `GET spreadsheets/{id}/values/{range}`
    Values { range: String },
    /// `POST spreadsheets/{id}:batchUpdate`
    BatchUpdate,
}

#[allow(async_fn_in_trait)]
pub trait SheetsTransport {
    /// Perform one request/response exchange. No retrying.
    async fn send(
        &self,
        endpoint: &Endpoint,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError>;
}

impl<T: SheetsTransport + ?Sized> SheetsTransport for &T {
    async fn send(
        &self,
        endpoint: &Endpoint,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError> {
        (**self).send(endpoint, body).await
    }
}
