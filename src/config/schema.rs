use crate::audit::{Strategy, DEFAULT_PAGESPEED_ENDPOINT};
use crate::routing::{default_routes, Route};
use crate::sheets::client::DEFAULT_SHEETS_BASE_URL;
use crate::source::DEFAULT_URL_RANGE;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RunConfig {
    #[serde(default = "default_name")]
    #[validate(length(min = 1))]
    pub name: String,

    /// Falls back to `GOOGLE_SHEET_ID`.
    #[serde(default)]
    pub spreadsheet_id: Option<String>,

    /// Falls back to `PAGE_SPEED_SERVICE_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default = "default_strategies")]
    #[validate(length(min = 1, max = 2))]
    pub strategies: Vec<Strategy>,

    #[serde(default = "default_routes")]
    #[validate]
    pub routes: Vec<Route>,

    #[serde(default = "default_concurrency")]
    #[validate(range(min = 1, max = 64))]
    pub concurrency: usize,

    #[serde(default = "default_timeout")]
    #[validate(range(min = 1))]
    pub timeout_secs: u64,

    #[serde(default = "default_write_retries")]
    #[validate(range(max = 5))]
    pub write_retries: u32,

    #[serde(default = "default_backoff")]
    pub retry_backoff_ms: u64,

    #[serde(default)]
    pub strict: bool,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub endpoints: Endpoints,

    /// Google service-account JSON key file; `GOOGLE_*` variables are used
    /// when absent.
    #[serde(default)]
    pub credentials_path: Option<String>,

    /// Optional path to a parent configuration file to inherit from
    #[serde(default)]
    pub extends: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Range {
        #[serde(default = "default_url_range")]
        range: String,
    },
    File {
        path: String,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Range {
            range: default_url_range(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputConfig {
    #[default]
    Sheets,
    Console,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_pagespeed_endpoint")]
    pub pagespeed: String,

    #[serde(default = "default_sheets_endpoint")]
    pub sheets: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            pagespeed: default_pagespeed_endpoint(),
            sheets: default_sheets_endpoint(),
        }
    }
}

impl RunConfig {
    /// Whether the run talks to the Sheets API at all.
    pub fn needs_sheets(&self) -> bool {
        self.output == OutputConfig::Sheets || matches!(self.source, SourceConfig::Range { .. })
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            spreadsheet_id: None,
            api_key: None,
            source: SourceConfig::default(),
            strategies: default_strategies(),
            routes: default_routes(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout(),
            write_retries: default_write_retries(),
            retry_backoff_ms: default_backoff(),
            strict: false,
            output: OutputConfig::default(),
            endpoints: Endpoints::default(),
            credentials_path: None,
            extends: None,
        }
    }
}

pub(crate) fn default_name() -> String {
    "pagespeed".to_string()
}

pub(crate) fn default_strategies() -> Vec<Strategy> {
    vec![Strategy::Mobile]
}

pub(crate) fn default_concurrency() -> usize {
    1
}

pub(crate) fn default_timeout() -> u64 {
    30
}

pub(crate) fn default_write_retries() -> u32 {
    1
}

pub(crate) fn default_backoff() -> u64 {
    500
}

fn default_url_range() -> String {
    DEFAULT_URL_RANGE.to_string()
}

fn default_pagespeed_endpoint() -> String {
    DEFAULT_PAGESPEED_ENDPOINT.to_string()
}

fn default_sheets_endpoint() -> String {
    DEFAULT_SHEETS_BASE_URL.to_string()
}
