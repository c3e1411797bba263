use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;

use super::service_account::ServiceAccountAuth;
use super::{ensure_success, transport_error};
use crate::core::errors::UpstreamError;
use crate::core::export::SpreadsheetReader;
use crate::core::sheet::RawGrid;

const SERVICE: &str = "sheets";
const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

/// `spreadsheets.values.get` response. `values` is absent for an empty range.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Google Sheets v4 reader.
pub struct GoogleSheetsClient {
    client: Client,
    auth: Arc<ServiceAccountAuth>,
    base_url: String,
}

impl GoogleSheetsClient {
    pub fn new(auth: Arc<ServiceAccountAuth>) -> Self {
        Self {
            client: Client::new(),
            auth,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Builds `.../v4/spreadsheets/{id}/values/{range}` with the range escaped
/// as a single path segment.
fn values_url(base_url: &str, spreadsheet_id: &str, range: &str) -> Result<Url, UpstreamError> {
    let mut url = Url::parse(base_url).map_err(|e| transport_error(SERVICE, e))?;
    url.path_segments_mut()
        .map_err(|_| transport_error(SERVICE, "base URL cannot have a path"))?
        .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);
    Ok(url)
}

/// Cells come back as strings (formatted values), but numbers and booleans
/// are accepted too.
fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn into_grid(range: ValueRange) -> RawGrid {
    range
        .values
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect::<Vec<Vec<String>>>()
        .into()
}

#[async_trait]
impl SpreadsheetReader for GoogleSheetsClient {
    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<RawGrid, UpstreamError> {
        let url = values_url(&self.base_url, spreadsheet_id, range)?;
        let token = self.auth.access_token().await?;

        tracing::debug!(spreadsheet_id, range, "Reading sheet range");

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;

        let body: ValueRange = response.json().await.map_err(|e| UpstreamError::Decode {
            service: SERVICE,
            message: e.to_string(),
        })?;

        Ok(into_grid(body))
    }
}
