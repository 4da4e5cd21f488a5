use crate::error::Result;
use async_trait::async_trait;

pub mod file;
pub mod range;

pub use file::FileUrlSource;
pub use range::RangeUrlSource;

pub const DEFAULT_URL_RANGE: &str = "URLList!A2:A";

/// Supplies the ordered list of URLs to audit.
///
/// Implementations return trimmed, non-empty entries in their original order;
/// duplicates are kept.
#[async_trait]
pub trait UrlSource: Send + Sync {
    fn describe(&self) -> String;
    async fn urls(&self) -> Result<Vec<String>>;
}

pub(crate) fn clean<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .filter_map(|entry| {
            let trimmed = entry.as_ref().trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}
