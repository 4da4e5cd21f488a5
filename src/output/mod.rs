use crate::error::Result;
use crate::row::ResultRow;
use async_trait::async_trait;

pub mod console;
pub mod sheets;

/// Destination for result rows. Appends only; nothing is ever overwritten.
///
/// Implementations are shared between concurrent URL tasks and must not
/// buffer rows locally.
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Appends `rows` to `range`, returning the number of cells written.
    async fn append(&self, range: &str, rows: &[ResultRow]) -> Result<u64>;
}
