//! Google Sheets v4 values API over a blocking HTTP client

use super::{SheetsService, UpdateSummary};
use crate::error::{Result, SyncError};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/";

pub struct GoogleSheets {
    client: Client,
    base_url: Url,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    /// `None` serializes as `null`, which the API skips
    values: [&'a [Option<String>]; 1],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValuesResponse {
    #[serde(default)]
    updated_range: String,
    #[serde(default)]
    updated_cells: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GoogleSheets {
    pub fn new(base_url: &str, access_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SyncError::Config(format!("invalid api_base_url '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::Config(format!(
                "invalid api_base_url '{}': not a base URL",
                base_url
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            client,
            base_url,
            access_token: access_token.into(),
        })
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}` with each segment percent-encoded
    fn values_url(&self, spreadsheet_id: &str, range: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);
        }
        url
    }
}

impl SheetsService for GoogleSheets {
    fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(spreadsheet_id, range);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .map_err(transport_error)?;
        let body: ValueRange = parse_response(response)?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Option<String>],
    ) -> Result<UpdateSummary> {
        let mut url = self.values_url(spreadsheet_id, range);
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        log::debug!("PUT {} ({} values)", url, values.len());

        let body = ValueRangeBody {
            range,
            major_dimension: "ROWS",
            values: [values],
        };
        let response = self
            .client
            .put(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .map_err(transport_error)?;
        let result: UpdateValuesResponse = parse_response(response)?;

        Ok(UpdateSummary {
            updated_range: result.updated_range,
            updated_cells: result.updated_cells,
        })
    }
}

fn parse_response<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T> {
    let status = response.status();
    let text = response.text().map_err(transport_error)?;
    if !status.is_success() {
        return Err(error_from_body(status, &text));
    }
    serde_json::from_str(&text).map_err(|e| SyncError::RemoteService {
        status: Some(status.as_u16()),
        message: format!("unexpected response body: {}", e),
    })
}

/// Map a failed response to an error, preferring Google's `error.message`
fn error_from_body(status: StatusCode, body: &str) -> SyncError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => body.trim().to_string(),
    };
    SyncError::RemoteService {
        status: Some(status.as_u16()),
        message,
    }
}

fn transport_error(e: reqwest::Error) -> SyncError {
    SyncError::RemoteService {
        status: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
    }
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        serde_json::Value::Bool(true) => "TRUE".to_string(),
        serde_json::Value::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}
