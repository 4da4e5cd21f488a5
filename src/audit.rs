//! PageSpeed Insights client and metric extraction.

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const DEFAULT_PAGESPEED_ENDPOINT: &str =
    "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

/// Device emulation mode for an audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Mobile,
    Desktop,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The seven measurements kept from a single audit.
///
/// Display values are passed through exactly as Lighthouse renders them
/// (e.g. "1.2 s"); the performance score is scaled to 0-100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub loading_time: String,
    pub performance_score: u32,
    pub first_contentful_paint: String,
    pub largest_contentful_paint: String,
    pub time_to_interactive: String,
    pub cumulative_layout_shift: String,
    pub first_input_delay: String,
}

impl MetricSet {
    /// Extracts the metric set from a `runPagespeed` response body.
    pub fn from_response(body: &Value) -> Result<Self> {
        Ok(Self {
            loading_time: display_value(body, "speed-index")?,
            performance_score: performance_score(body)?,
            first_contentful_paint: display_value(body, "first-contentful-paint")?,
            largest_contentful_paint: display_value(body, "largest-contentful-paint")?,
            time_to_interactive: display_value(body, "interactive")?,
            cumulative_layout_shift: display_value(body, "cumulative-layout-shift")?,
            first_input_delay: display_value(body, "max-potential-fid")?,
        })
    }
}

fn lookup<'a>(body: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(body, |node, key| node.get(*key))
}

fn display_value(body: &Value, audit: &str) -> Result<String> {
    let path = ["lighthouseResult", "audits", audit, "displayValue"];
    lookup(body, &path)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::MissingMetric {
            path: path.join("."),
        })
}

fn performance_score(body: &Value) -> Result<u32> {
    let path = ["lighthouseResult", "categories", "performance", "score"];
    let score = lookup(body, &path)
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::MissingMetric {
            path: path.join("."),
        })?;
    // Scores are reported with two decimals; 0.87 * 100.0 is not exactly 87.
    Ok((score * 100.0).round().clamp(0.0, 100.0) as u32)
}

/// Anything that can audit a URL under a strategy.
#[async_trait]
pub trait AuditSource: Send + Sync {
    async fn fetch(&self, url: &str, strategy: Strategy) -> Result<MetricSet>;
}

pub struct InsightsFetcher {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl InsightsFetcher {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    async fn request(&self, url: &str, strategy: Strategy) -> std::result::Result<Value, String> {
        let res = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("url", url),
                ("key", self.api_key.as_str()),
                ("strategy", strategy.as_str()),
            ])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = res.status();
        if !status.is_success() {
            return Err(format!("HTTP error: {}", status));
        }

        res.json::<Value>().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl AuditSource for InsightsFetcher {
    async fn fetch(&self, url: &str, strategy: Strategy) -> Result<MetricSet> {
        log::debug!("Auditing {} ({})", url, strategy);

        let failed = |reason: String| Error::FetchFailed {
            url: url.to_string(),
            strategy: strategy.to_string(),
            reason,
        };

        let body = self.request(url, strategy).await.map_err(failed)?;
        MetricSet::from_response(&body).map_err(|e| failed(e.to_string()))
    }
}
