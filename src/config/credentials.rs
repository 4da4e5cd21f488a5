use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Google service-account key, as found in a downloaded JSON key file or
/// spread across `GOOGLE_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", alias = "service_account_type", default)]
    pub account_type: Option<String>,

    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub private_key_id: Option<String>,

    pub private_key: String,

    pub client_email: String,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub auth_uri: Option<String>,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    #[serde(default, alias = "auth_provider_cert_url")]
    pub auth_provider_x509_cert_url: Option<String>,

    #[serde(default, alias = "client_cert_url")]
    pub client_x509_cert_url: Option<String>,

    #[serde(default)]
    pub universe_domain: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let key: Self = serde_json::from_str(&content)?;
        Ok(key.normalized())
    }

    /// Collects `GOOGLE_*` variables (e.g. `GOOGLE_CLIENT_EMAIL`,
    /// `GOOGLE_PRIVATE_KEY`) into a key.
    pub fn from_env() -> Result<Self> {
        let key: Self = ::config::Config::builder()
            .add_source(::config::Environment::with_prefix("GOOGLE"))
            .build()?
            .try_deserialize()?;
        Ok(key.normalized())
    }

    /// Private keys pasted into `.env` files usually carry literal `\n`.
    fn normalized(mut self) -> Self {
        self.private_key = self.private_key.replace("\\n", "\n");
        self
    }
}
