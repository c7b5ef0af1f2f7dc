use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.schwabapi.com";
pub const DEFAULT_REDIRECT_URI: &str = "https://127.0.0.1";

/// Root configuration (`quotebridge.toml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteBridgeConfig {
    pub api: ApiConfig,
    pub oauth: OAuthSettings,
    /// Env-style file holding client credentials and the current token pair.
    pub env_file: PathBuf,
}

impl Default for QuoteBridgeConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            oauth: OAuthSettings::default(),
            env_file: PathBuf::from(".env"),
        }
    }
}

/// Brokerage REST API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Per-request timeout for every HTTP call, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            request_timeout_secs: 30,
        }
    }
}

/// OAuth endpoints and the registered redirect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSettings {
    /// Override the authorize endpoint (defaults to `{base_url}/v1/oauth/authorize`).
    pub authorize_url: Option<String>,
    /// Override the token endpoint (defaults to `{base_url}/v1/oauth/token`).
    pub token_url: Option<String>,
    /// Must match the callback URL registered for the app.
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            authorize_url: None,
            token_url: None,
            redirect_uri: DEFAULT_REDIRECT_URI.into(),
            scopes: vec!["AccountAccess".into(), "Trading".into()],
        }
    }
}

impl QuoteBridgeConfig {
    pub fn base_url(&self) -> &str {
        self.api.base_url.trim_end_matches('/')
    }

    pub fn authorize_url(&self) -> String {
        self.oauth
            .authorize_url
            .clone()
            .unwrap_or_else(|| format!("{}/v1/oauth/authorize", self.base_url()))
    }

    pub fn token_url(&self) -> String {
        self.oauth
            .token_url
            .clone()
            .unwrap_or_else(|| format!("{}/v1/oauth/token", self.base_url()))
    }
}
