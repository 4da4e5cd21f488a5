use super::{UrlSource, clean};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// One URL per line in a local text file.
pub struct FileUrlSource {
    path: PathBuf,
}

impl FileUrlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl UrlSource for FileUrlSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn urls(&self) -> Result<Vec<String>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::SourceUnavailable(format!("{}: {}", self.path.display(), e)))?;

        let urls = clean(content.lines());
        if urls.is_empty() {
            return Err(Error::SourceUnavailable(format!(
                "{} contains no URLs",
                self.path.display()
            )));
        }
        Ok(urls)
    }
}
