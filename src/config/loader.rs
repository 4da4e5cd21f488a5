use crate::audit::InsightsFetcher;
use crate::config::credentials::ServiceAccountKey;
use crate::config::schema::{self, Endpoints, OutputConfig, RunConfig, SourceConfig};
use crate::error::{Error, Result};
use crate::output::{console::ConsoleSink, sheets::SheetsSink, RowSink};
use crate::pipeline::{Pipeline, PipelineOptions};
use crate::routing::{default_routes, Router};
use crate::sheets::{ServiceAccountTokenProvider, SheetsClient, StaticTokenProvider, TokenProvider};
use crate::source::{FileUrlSource, RangeUrlSource, UrlSource};
use reqwest::Client;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

pub const API_KEY_VAR: &str = "PAGE_SPEED_SERVICE_API_KEY";
pub const SHEET_ID_VAR: &str = "GOOGLE_SHEET_ID";
pub const ACCESS_TOKEN_VAR: &str = "GOOGLE_ACCESS_TOKEN";

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
        let path = path.as_ref();
        let mut visited = HashSet::new();
        Self::load_with_inheritance(path, &mut visited, false)
    }

    fn load_with_inheritance(
        path: &Path,
        visited: &mut HashSet<PathBuf>,
        is_parent_load: bool,
    ) -> Result<RunConfig> {
        let path = fs::canonicalize(path).map_err(|e| {
            Error::Config(format!("{}: {}", path.display(), e))
        })?;

        if visited.contains(&path) {
            return Err(Error::Config(format!(
                "Circular inheritance detected involving {}",
                path.display()
            )));
        }
        visited.insert(path.clone());

        let config = Self::load_file(&path)?;

        let final_config = if let Some(parent_path_str) = &config.extends {
            let parent_path = path.parent()
                .ok_or_else(|| Error::Config(format!(
                    "Cannot determine parent directory for {}",
                    path.display()
                )))?
                .join(parent_path_str);

            let parent_config = Self::load_with_inheritance(&parent_path, visited, true)?;
            Self::merge_configs(parent_config, config)
        } else {
            config
        };

        if !is_parent_load {
            final_config.validate()?;
        }

        Ok(final_config)
    }

    fn load_file(path: &Path) -> Result<RunConfig> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let config: RunConfig = serde_json::from_str(&content)?;
                Ok(config)
            }
            Some("yaml") | Some("yml") => {
                let config: RunConfig = serde_yaml::from_str(&content)?;
                Ok(config)
            }
            Some("toml") => {
                let config: RunConfig = toml::from_str(&content)?;
                Ok(config)
            }
            _ => Err(Error::Config(format!(
                "Unsupported file extension: {}",
                path.display()
            ))),
        }
    }

    /// Child values win wherever they differ from the defaults.
    fn merge_configs(mut parent: RunConfig, child: RunConfig) -> RunConfig {
        if child.name != schema::default_name() {
            parent.name = child.name;
        }
        if child.spreadsheet_id.is_some() {
            parent.spreadsheet_id = child.spreadsheet_id;
        }
        if child.api_key.is_some() {
            parent.api_key = child.api_key;
        }
        if child.source != SourceConfig::default() {
            parent.source = child.source;
        }
        if child.strategies != schema::default_strategies() {
            parent.strategies = child.strategies;
        }
        if child.routes != default_routes() {
            parent.routes = child.routes;
        }
        if child.concurrency != schema::default_concurrency() {
            parent.concurrency = child.concurrency;
        }
        if child.timeout_secs != schema::default_timeout() {
            parent.timeout_secs = child.timeout_secs;
        }
        if child.write_retries != schema::default_write_retries() {
            parent.write_retries = child.write_retries;
        }
        if child.retry_backoff_ms != schema::default_backoff() {
            parent.retry_backoff_ms = child.retry_backoff_ms;
        }
        if child.strict {
            parent.strict = true;
        }
        if child.output != OutputConfig::default() {
            parent.output = child.output;
        }
        if child.endpoints != Endpoints::default() {
            parent.endpoints = child.endpoints;
        }
        if child.credentials_path.is_some() {
            parent.credentials_path = child.credentials_path;
        }

        parent.extends = None;
        parent
    }

    /// Fills `api_key` and `spreadsheet_id` from the environment when the
    /// file leaves them out.
    pub fn apply_env(config: &mut RunConfig) {
        if config.api_key.is_none() {
            config.api_key = std::env::var(API_KEY_VAR).ok().filter(|v| !v.is_empty());
        }
        if config.spreadsheet_id.is_none() {
            config.spreadsheet_id = std::env::var(SHEET_ID_VAR).ok().filter(|v| !v.is_empty());
        }
    }

    fn token_provider(config: &RunConfig, http: &Client) -> Result<Arc<dyn TokenProvider>> {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_VAR) {
            if !token.is_empty() {
                log::info!("Using access token from {}", ACCESS_TOKEN_VAR);
                return Ok(Arc::new(StaticTokenProvider::new(token)));
            }
        }

        let key = match &config.credentials_path {
            Some(path) => ServiceAccountKey::from_file(path)?,
            None => ServiceAccountKey::from_env().map_err(|e| {
                Error::Config(format!("No service-account credentials: {}", e))
            })?,
        };
        log::info!("Authenticating as {}", key.client_email);
        Ok(Arc::new(ServiceAccountTokenProvider::new(http.clone(), key)))
    }

    pub fn create_pipeline(
        config: &RunConfig,
        multi: Option<Arc<indicatif::MultiProgress>>,
    ) -> Result<Pipeline> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            Error::Config(format!("api_key is not set (config file or {})", API_KEY_VAR))
        })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("pagespeed-sheets/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let sheets = if config.needs_sheets() {
            let spreadsheet_id = config.spreadsheet_id.clone().ok_or_else(|| {
                Error::Config(format!(
                    "spreadsheet_id is not set (config file or {})",
                    SHEET_ID_VAR
                ))
            })?;
            let tokens = Self::token_provider(config, &http)?;
            Some(Arc::new(SheetsClient::new(
                http.clone(),
                &config.endpoints.sheets,
                spreadsheet_id,
                tokens,
            )?))
        } else {
            None
        };

        let source: Arc<dyn UrlSource> = match (&config.source, &sheets) {
            (SourceConfig::File { path }, _) => Arc::new(FileUrlSource::new(path)),
            (SourceConfig::Range { range }, Some(client)) => {
                Arc::new(RangeUrlSource::new(client.clone(), range.clone()))
            }
            (SourceConfig::Range { .. }, None) => {
                return Err(Error::Config("Range source requires a Sheets client".into()));
            }
        };

        let sink: Arc<dyn RowSink> = match (config.output, &sheets) {
            (OutputConfig::Console, _) => Arc::new(ConsoleSink::new(multi)),
            (OutputConfig::Sheets, Some(client)) => Arc::new(SheetsSink::new(client.clone())),
            (OutputConfig::Sheets, None) => {
                return Err(Error::Config("Sheets output requires a Sheets client".into()));
            }
        };

        let auditor = Arc::new(InsightsFetcher::new(
            http,
            config.endpoints.pagespeed.clone(),
            api_key,
        ));

        Ok(Pipeline::new(
            source,
            auditor,
            sink,
            Router::new(config.routes.clone()),
            Self::pipeline_options(config),
        ))
    }

    pub fn pipeline_options(config: &RunConfig) -> PipelineOptions {
        PipelineOptions {
            strategies: config.strategies.clone(),
            concurrency: config.concurrency,
            call_timeout: Duration::from_secs(config.timeout_secs),
            write_retries: config.write_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            strict: config.strict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Strategy;
    use crate::config::test_env;
    use crate::routing::Route;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn yaml_defaults_cover_range_source_and_default_routes() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "run.yaml", "spreadsheet_id: sheet-123\n");

        let config = ConfigLoader::load(&path).unwrap();
        assert_eq!(config.strategies, vec![Strategy::Mobile]);
        assert_eq!(
            config.source,
            SourceConfig::Range {
                range: "URLList!A2:A".into()
            }
        );
        assert_eq!(config.routes, default_routes());
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.output, OutputConfig::Sheets);
    }

    #[test]
    fn toml_file_source_and_both_strategies() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "run.toml",
            r#"
name = "nightly"
strategies = ["mobile", "desktop"]
output = "console"

[source]
type = "file"
path = "urls.txt"

[[routes]]
pattern = "example.org"
range = "Example!A1:J"
"#,
        );

        let config = ConfigLoader::load(&path).unwrap();
        assert_eq!(config.name, "nightly");
        assert_eq!(config.strategies, vec![Strategy::Mobile, Strategy::Desktop]);
        assert_eq!(config.source, SourceConfig::File { path: "urls.txt".into() });
        assert_eq!(config.routes, vec![Route::new("example.org", "Example!A1:J")]);
        assert!(!config.needs_sheets());
    }

    #[test]
    fn child_overrides_parent() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "base.json",
            r#"{"name": "base", "spreadsheet_id": "sheet-1", "concurrency": 4}"#,
        );
        let child = write(
            &dir,
            "child.yaml",
            "extends: base.json\nname: child\nstrategies: [desktop]\n",
        );

        let config = ConfigLoader::load(&child).unwrap();
        assert_eq!(config.name, "child");
        assert_eq!(config.spreadsheet_id.as_deref(), Some("sheet-1"));
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.strategies, vec![Strategy::Desktop]);
        assert!(config.extends.is_none());
    }

    #[test]
    fn circular_inheritance_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.yaml", "extends: b.yaml\n");
        let b = write(&dir, "b.yaml", "extends: a.yaml\n");

        let err = ConfigLoader::load(&b).unwrap_err();
        assert!(err.to_string().contains("Circular inheritance"));
    }

    #[test]
    fn empty_strategy_list_fails_validation() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "run.json", r#"{"strategies": []}"#);

        let err = ConfigLoader::load(&path).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "run.ini", "name = x");

        let err = ConfigLoader::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn dry_run_from_file_needs_no_sheets_credentials() {
        let config = RunConfig {
            api_key: Some("key".into()),
            source: SourceConfig::File {
                path: "urls.txt".into(),
            },
            output: OutputConfig::Console,
            ..Default::default()
        };
        assert!(ConfigLoader::create_pipeline(&config, None).is_ok());
    }

    #[test]
    fn missing_api_key_is_reported() {
        let config = RunConfig {
            api_key: None,
            output: OutputConfig::Console,
            source: SourceConfig::File {
                path: "urls.txt".into(),
            },
            ..Default::default()
        };
        let _env = test_env::lock();
        test_env::remove(API_KEY_VAR);

        let err = ConfigLoader::create_pipeline(&config, None).err().unwrap();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn env_fills_only_missing_keys() {
        let _env = test_env::lock();
        test_env::set(API_KEY_VAR, "env-key");
        test_env::set(SHEET_ID_VAR, "env-sheet");

        let mut empty = RunConfig::default();
        ConfigLoader::apply_env(&mut empty);
        assert_eq!(empty.api_key.as_deref(), Some("env-key"));
        assert_eq!(empty.spreadsheet_id.as_deref(), Some("env-sheet"));

        let mut explicit = RunConfig {
            api_key: Some("file-key".into()),
            spreadsheet_id: Some("file-sheet".into()),
            ..Default::default()
        };
        ConfigLoader::apply_env(&mut explicit);
        assert_eq!(explicit.api_key.as_deref(), Some("file-key"));
        assert_eq!(explicit.spreadsheet_id.as_deref(), Some("file-sheet"));

        test_env::set(API_KEY_VAR, "");
        let mut blank = RunConfig::default();
        ConfigLoader::apply_env(&mut blank);
        assert!(blank.api_key.is_none());

        test_env::remove(API_KEY_VAR);
        test_env::remove(SHEET_ID_VAR);
    }

    #[tokio::test]
    async fn access_token_env_wins_over_credentials_path() {
        let config = RunConfig {
            credentials_path: Some("/nonexistent/key.json".into()),
            ..Default::default()
        };
        let http = Client::new();

        let provider = {
            let _env = test_env::lock();
            test_env::set(ACCESS_TOKEN_VAR, "env-token");
            let provider = ConfigLoader::token_provider(&config, &http);
            test_env::remove(ACCESS_TOKEN_VAR);
            provider
        };
        assert_eq!(provider.unwrap().access_token().await.unwrap(), "env-token");

        let fallback = {
            let _env = test_env::lock();
            test_env::remove(ACCESS_TOKEN_VAR);
            ConfigLoader::token_provider(&config, &http)
        };
        assert!(matches!(fallback, Err(Error::Config(_))));
    }
}
