use super::{UrlSource, clean};
use crate::error::{Error, Result};
use crate::sheets::SheetsClient;
use async_trait::async_trait;
use std::sync::Arc;

/// URLs kept in the first column of a spreadsheet range.
pub struct RangeUrlSource {
    client: Arc<SheetsClient>,
    range: String,
}

impl RangeUrlSource {
    pub fn new(client: Arc<SheetsClient>, range: impl Into<String>) -> Self {
        Self {
            client,
            range: range.into(),
        }
    }
}

#[async_trait]
impl UrlSource for RangeUrlSource {
    fn describe(&self) -> String {
        format!("range {} of {}", self.range, self.client.spreadsheet_id())
    }

    async fn urls(&self) -> Result<Vec<String>> {
        let rows = self.client.get_values(&self.range).await.map_err(|e| match e {
            Error::SourceUnavailable(_) => e,
            other => Error::SourceUnavailable(format!("{}: {}", self.range, other)),
        })?;

        let urls = clean(rows.into_iter().filter_map(|row| row.into_iter().next()));
        if urls.is_empty() {
            return Err(Error::SourceUnavailable(format!("{} is empty", self.range)));
        }
        Ok(urls)
    }
}
