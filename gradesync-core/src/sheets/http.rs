//! Google Sheets v4 REST transport.
//!
//! Authenticates with a bearer access token obtained outside gradesync.

use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

use crate::error::{ApiError, GradeSyncError, GradeSyncResult};
use crate::sheets::{Endpoint, SheetsTransport};

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const USER_AGENT: &str = concat!("gradesync/", env!("CARGO_PKG_VERSION"));
/// Error text the API returns when a range names a sheet that doesn't exist.
const UNPARSABLE_RANGE: &str = "Unable to parse range";

pub struct GoogleSheetsClient {
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    access_token: String,
}

impl GoogleSheetsClient {
    pub fn new(spreadsheet_id: &str, access_token: &str) -> GradeSyncResult<Self> {
        Self::with_base_url(spreadsheet_id, access_token, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        spreadsheet_id: &str,
        access_token: &str,
        base_url: &str,
    ) -> GradeSyncResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GradeSyncError::Config(format!("Could not build HTTP client: {e}")))?;

        Ok(GoogleSheetsClient {
            http,
            base_url: base_url.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            access_token: access_token.to_string(),
        })
    }

    fn url(&self, endpoint: &Endpoint) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::Transport(format!("invalid base URL '{}': {e}", self.base_url)))?;

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::Transport(format!("base URL '{}' cannot have a path", self.base_url)))?;
            segments.pop_if_empty().push("spreadsheets");

            match endpoint {
                Endpoint::Spreadsheet { .. } => {
                    segments.push(&self.spreadsheet_id);
                }
                Endpoint::Values { range } => {
                    segments.push(&self.spreadsheet_id).push("values").push(range);
                }
                Endpoint::BatchUpdate => {
                    segments.push(&format!("{}:batchUpdate", self.spreadsheet_id));
                }
            }
        }

        if let Endpoint::Spreadsheet { fields } = endpoint {
            url.query_pairs_mut().append_pair("fields", fields);
        }

        Ok(url)
    }
}

impl SheetsTransport for GoogleSheetsClient {
    async fn send(
        &self,
        endpoint: &Endpoint,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError> {
        let url = self.url(endpoint)?;

        let request = match endpoint {
            Endpoint::BatchUpdate => self.http.post(url).json(body.unwrap_or(&serde_json::Value::Null)),
            _ => self.http.get(url),
        };

        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| ApiError::Transport(format!("invalid JSON response: {e}")));
        }

        let text = response.text().await.unwrap_or_default();
        let message = error_message(&text);

        Err(classify_failure(status, endpoint, message))
    }
}

fn classify_failure(status: StatusCode, endpoint: &Endpoint, message: String) -> ApiError {
    match (status, endpoint) {
        (StatusCode::TOO_MANY_REQUESTS, _) => ApiError::RateLimited(message),
        (StatusCode::BAD_REQUEST, Endpoint::Values { range }) if message.contains(UNPARSABLE_RANGE) => {
            ApiError::MissingSubsheet(range.clone())
        }
        _ => ApiError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

/// Pull `error.message` out of a Google API error body, falling back to the
/// (truncated) raw text.
fn error_message(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| text.chars().take(200).collect())
}
