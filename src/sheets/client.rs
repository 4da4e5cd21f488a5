use crate::error::{Error, Result};
use crate::row::ResultRow;
use crate::sheets::auth::TokenProvider;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct AppendBody<'a> {
    values: &'a [ResultRow],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    #[serde(default)]
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    #[serde(default)]
    updated_cells: u64,
}

/// Minimal Sheets v4 `values` client: read a range, append rows to a range.
///
/// Stateless apart from the token provider, so it can be shared across tasks.
pub struct SheetsClient {
    http: Client,
    base_url: Url,
    spreadsheet_id: String,
    tokens: Arc<dyn TokenProvider>,
}

impl SheetsClient {
    pub fn new(
        http: Client,
        base_url: &str,
        spreadsheet_id: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            spreadsheet_id: spreadsheet_id.into(),
            tokens,
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn values_url(&self, last_segment: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Invalid Sheets base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", last_segment]);
        Ok(url)
    }

    async fn check(res: Response) -> std::result::Result<Response, String> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        Err(format!("HTTP {}: {}", status, body.trim()))
    }

    /// Cell values of `range`, one inner vector per row. Non-string cells are
    /// rendered with their JSON representation.
    pub async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(range)?;
        let token = self.tokens.access_token().await?;
        log::debug!("Reading range {} from {}", range, self.spreadsheet_id);

        let res = self.http.get(url).bearer_auth(token).send().await?;
        let res = Self::check(res)
            .await
            .map_err(|reason| Error::SourceUnavailable(format!("{}: {}", range, reason)))?;
        let body: ValueRange = res.json().await?;

        Ok(body
            .values
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| match cell {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect())
    }

    /// Appends `rows` after the existing content of `range` and returns the
    /// number of cells the API reports as written.
    pub async fn append_values(&self, range: &str, rows: &[ResultRow]) -> Result<u64> {
        let failed = |reason: String| Error::WriteFailed {
            range: range.to_string(),
            reason,
        };

        let url = self.values_url(&format!("{}:append", range))?;
        let token = self.tokens.access_token().await?;

        let res = self
            .http
            .post(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&AppendBody { values: rows })
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        let res = Self::check(res).await.map_err(failed)?;
        let body: AppendResponse = res.json().await.map_err(|e| failed(e.to_string()))?;

        Ok(body.updates.map(|u| u.updated_cells).unwrap_or(0))
    }
}
