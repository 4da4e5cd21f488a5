use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// The URL list could not be produced. Fatal for the whole run.
    #[error("URL source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Audit request failed for {url} ({strategy}): {reason}")]
    FetchFailed {
        url: String,
        strategy: String,
        reason: String,
    },

    #[error("Metric extraction failed: missing `{path}`")]
    MissingMetric { path: String },

    #[error("Append to {range} failed: {reason}")]
    WriteFailed { range: String, reason: String },

    #[error("No route matched {0}")]
    NoRouteMatched(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Environment error: {0}")]
    Env(#[from] ::config::ConfigError),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}
