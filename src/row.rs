use crate::audit::{MetricSet, Strategy};
use chrono::{DateTime, Local, SecondsFormat, TimeZone};
use serde::{Deserialize, Serialize};

/// A single scalar cell as sent to the Sheets API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(u32),
    Text(String),
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Number(value)
    }
}

/// One appended row: timestamp, URL, optional strategy label, then the metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRow(Vec<CellValue>);

impl ResultRow {
    pub fn new<Tz: TimeZone>(
        timestamp: &DateTime<Tz>,
        url: &str,
        strategy: Option<Strategy>,
        metrics: &MetricSet,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let mut cells: Vec<CellValue> = Vec::with_capacity(10);
        cells.push(timestamp.to_rfc3339_opts(SecondsFormat::Secs, false).into());
        cells.push(url.into());
        if let Some(strategy) = strategy {
            cells.push(strategy.as_str().into());
        }
        cells.push(metrics.loading_time.clone().into());
        cells.push(metrics.performance_score.into());
        cells.push(metrics.first_contentful_paint.clone().into());
        cells.push(metrics.largest_contentful_paint.clone().into());
        cells.push(metrics.time_to_interactive.clone().into());
        cells.push(metrics.cumulative_layout_shift.clone().into());
        cells.push(metrics.first_input_delay.clone().into());
        Self(cells)
    }

    /// Row stamped with the current local time.
    pub fn now(url: &str, strategy: Option<Strategy>, metrics: &MetricSet) -> Self {
        Self::new(&Local::now(), url, strategy, metrics)
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
