use super::RowSink;
use crate::error::Result;
use crate::row::ResultRow;
use crate::sheets::SheetsClient;
use async_trait::async_trait;
use std::sync::Arc;

pub struct SheetsSink {
    client: Arc<SheetsClient>,
}

impl SheetsSink {
    pub fn new(client: Arc<SheetsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RowSink for SheetsSink {
    async fn append(&self, range: &str, rows: &[ResultRow]) -> Result<u64> {
        let cells = self.client.append_values(range, rows).await?;
        log::info!("{} cells appended to {}", cells, range);
        Ok(cells)
    }
}
