use super::RowSink;
use crate::error::{Error, Result};
use crate::row::ResultRow;
use async_trait::async_trait;
use indicatif::MultiProgress;
use std::sync::Arc;

/// Dry-run sink: prints rows instead of appending them.
pub struct ConsoleSink {
    multi: Option<Arc<MultiProgress>>,
}

impl ConsoleSink {
    pub fn new(multi: Option<Arc<MultiProgress>>) -> Self {
        Self { multi }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl RowSink for ConsoleSink {
    async fn append(&self, range: &str, rows: &[ResultRow]) -> Result<u64> {
        let mut cells = 0;
        for row in rows {
            let line = format!("{} <- {}", range, serde_json::to_string(row)?);
            if let Some(multi) = &self.multi {
                multi.println(line).map_err(|e| Error::WriteFailed {
                    range: range.to_string(),
                    reason: e.to_string(),
                })?;
            } else {
                println!("{}", line);
            }
            cells += row.len() as u64;
        }
        Ok(cells)
    }
}
