pub mod audit;
pub mod config;
pub mod error;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod routing;
pub mod row;
pub mod sheets;
pub mod source;

pub use audit::{AuditSource, InsightsFetcher, MetricSet, Strategy};
pub use error::{Error, Result};
pub use metrics::collector::MetricsCollector;
pub use metrics::snapshot::RunSummary;
pub use output::RowSink;
pub use pipeline::{Pipeline, PipelineOptions, UrlOutcome};
pub use routing::{Route, Router};
pub use row::{CellValue, ResultRow};
pub use source::UrlSource;
