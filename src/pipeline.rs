use crate::audit::{AuditSource, MetricSet, Strategy};
use crate::error::{Error, Result};
use crate::metrics::collector::MetricsCollector;
use crate::metrics::snapshot::RunSummary;
use crate::output::RowSink;
use crate::routing::Router;
use crate::row::ResultRow;
use crate::source::UrlSource;
use futures::stream::{StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, timeout};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Strategies audited per URL, in this order.
    pub strategies: Vec<Strategy>,
    /// URLs in flight at once. 1 keeps appends in input order.
    pub concurrency: usize,
    /// Upper bound for each audit call.
    pub call_timeout: Duration,
    /// Extra attempts after a failed append.
    pub write_retries: u32,
    pub retry_backoff: Duration,
    /// Abort the run on the first failed URL.
    pub strict: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            strategies: vec![Strategy::Mobile],
            concurrency: 1,
            call_timeout: Duration::from_secs(30),
            write_retries: 1,
            retry_backoff: Duration::from_millis(500),
            strict: false,
        }
    }
}

#[derive(Debug)]
pub enum UrlOutcome {
    /// Every strategy was audited and its row appended.
    Succeeded { rows: usize },
    /// No route matched; nothing was written.
    Skipped,
    /// At least one audit or append failed. Rows that did succeed stay written.
    Failed(Error),
}

pub struct Pipeline {
    source: Arc<dyn UrlSource>,
    auditor: Arc<dyn AuditSource>,
    sink: Arc<dyn RowSink>,
    router: Router,
    options: PipelineOptions,
    metrics: Arc<MetricsCollector>,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn UrlSource>,
        auditor: Arc<dyn AuditSource>,
        sink: Arc<dyn RowSink>,
        router: Router,
        options: PipelineOptions,
    ) -> Self {
        Self {
            source,
            auditor,
            sink,
            router,
            options,
            metrics: Arc::new(MetricsCollector::new()),
        }
    }

    /// Audits every URL from the source and appends the routed rows.
    ///
    /// Only an unreadable URL source, or a failed URL in strict mode, makes
    /// this return an error. Ctrl-C stops the run early; rows already
    /// appended stay in the sheet.
    pub async fn run(&self) -> Result<RunSummary> {
        let result = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Shutting down...");
                Ok(())
            }
            result = self.drive() => result,
        };

        result.map(|_| self.metrics.snapshot())
    }

    async fn drive(&self) -> Result<()> {
        log::info!("Reading URLs from {}", self.source.describe());
        let urls = self.source.urls().await?;
        log::info!("Loaded {} URLs", urls.len());

        let (urls_tx, urls_rx) = mpsc::channel(1000);
        let metrics_seed = self.metrics.clone();
        tokio::spawn(async move {
            for url in urls {
                if urls_tx.send(url).await.is_err() {
                    break;
                }
                metrics_seed.increment_urls_queued();
            }
        });

        let concurrency = self.options.concurrency.max(1);
        tokio_stream::wrappers::ReceiverStream::new(urls_rx)
            .map(Ok::<String, Error>)
            .try_for_each_concurrent(concurrency, |url| async move {
                self.metrics.increment_active_workers();
                let outcome = self.process_url(&url).await;
                self.metrics.decrement_active_workers();
                self.record(&url, outcome)
            })
            .await?;

        log::info!("Run finished.");
        Ok(())
    }

    fn record(&self, url: &str, outcome: UrlOutcome) -> Result<()> {
        match outcome {
            UrlOutcome::Succeeded { rows } => {
                log::debug!("{}: {} rows written", url, rows);
                self.metrics.record_url_succeeded();
            }
            UrlOutcome::Skipped => self.metrics.record_url_skipped(),
            UrlOutcome::Failed(e) => {
                self.metrics.record_url_failed();
                if self.options.strict {
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Audits one URL under every configured strategy and appends its rows.
    pub async fn process_url(&self, url: &str) -> UrlOutcome {
        let labelled = self.options.strategies.len() > 1;
        let mut rows = Vec::with_capacity(self.options.strategies.len());
        let mut failure = None;

        for &strategy in &self.options.strategies {
            match self.fetch(url, strategy).await {
                Ok(metrics) => {
                    let row = ResultRow::now(url, labelled.then_some(strategy), &metrics);
                    log::info!(
                        "{} results for {}: {}",
                        strategy,
                        url,
                        serde_json::to_string(&row).unwrap_or_default()
                    );
                    rows.push(row);
                }
                Err(e) => {
                    log::error!("{}", e);
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        let Some(route) = self.router.resolve(url) else {
            log::warn!(
                "{}, dropping {} rows",
                Error::NoRouteMatched(url.to_string()),
                rows.len()
            );
            return match failure {
                Some(e) => UrlOutcome::Failed(e),
                None => UrlOutcome::Skipped,
            };
        };

        let mut written = 0;
        for row in &rows {
            match self.append_with_retry(&route.range, row).await {
                Ok(cells) => {
                    self.metrics.record_append(1, cells);
                    written += 1;
                }
                Err(e) => {
                    log::error!("{}", e);
                    self.metrics.increment_writes_failed();
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        match failure {
            Some(e) => UrlOutcome::Failed(e),
            None => UrlOutcome::Succeeded { rows: written },
        }
    }

    async fn fetch(&self, url: &str, strategy: Strategy) -> Result<MetricSet> {
        let start = Instant::now();
        let call = self.auditor.fetch(url, strategy);
        let result = match timeout(self.options.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::FetchFailed {
                url: url.to_string(),
                strategy: strategy.to_string(),
                reason: format!("timed out after {:?}", self.options.call_timeout),
            }),
        };
        self.metrics.record_fetch(start.elapsed(), result.is_ok());
        result
    }

    async fn append_with_retry(&self, range: &str, row: &ResultRow) -> Result<u64> {
        let mut attempt = 0;
        loop {
            match self.sink.append(range, std::slice::from_ref(row)).await {
                Ok(cells) => return Ok(cells),
                Err(e) if attempt < self.options.write_retries => {
                    attempt += 1;
                    log::warn!(
                        "Append to {} failed ({}), retry {} of {}",
                        range,
                        e,
                        attempt,
                        self.options.write_retries
                    );
                    sleep(self.options.retry_backoff * attempt).await;
                }
                Err(e @ Error::WriteFailed { .. }) => return Err(e),
                Err(other) => {
                    return Err(Error::WriteFailed {
                        range: range.to_string(),
                        reason: other.to_string(),
                    })
                }
            }
        }
    }

    pub fn watch_metrics(&self) -> watch::Receiver<RunSummary> {
        let (tx, rx) = watch::channel(self.metrics.snapshot());
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(500));
            loop {
                interval.tick().await;
                if tx.send(metrics.snapshot()).is_err() {
                    break;
                }
            }
        });
        rx
    }
}
