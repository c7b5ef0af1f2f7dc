use std::{path::Path, sync::Arc, time::Duration};

use {
    anyhow::{Context as _, Result},
    quotebridge_config::{
        EnvFile, QuoteBridgeConfig, apply_env_overrides, discover_and_load, load_config,
        load_credentials,
    },
    quotebridge_marketdata::AuthenticatedClient,
    quotebridge_oauth::{EnvTokenStorage, OAuthFlow, TokenStore, load_endpoints},
    tracing::debug,
};

/// Resolved settings plus the pieces every command builds from them.
pub struct Context {
    config: QuoteBridgeConfig,
}

impl Context {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let mut config = load_config(path)?;
                apply_env_overrides(&mut config, |key| std::env::var(key).ok());
                config
            },
            None => discover_and_load(),
        };
        Ok(Self { config })
    }

    pub fn from_config(config: QuoteBridgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QuoteBridgeConfig {
        &self.config
    }

    pub fn env_file(&self) -> EnvFile {
        EnvFile::new(&self.config.env_file)
    }

    fn http(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.api.request_timeout_secs))
            .build()
            .context("failed to build HTTP client")
    }

    /// Token store restored from the env file. Needs client credentials.
    pub fn token_store(&self) -> Result<Arc<TokenStore>> {
        let env_file = self.env_file();
        let credentials = load_credentials(&env_file).with_context(|| {
            format!(
                "client credentials not found in the environment or {}",
                env_file.path().display()
            )
        })?;
        debug!(client_id = %credentials.client_id_hint(), "loaded client credentials");

        let flow = OAuthFlow::with_client(self.http()?, load_endpoints(&self.config), credentials);
        let store = TokenStore::restore(flow, EnvTokenStorage::new(env_file))?;
        Ok(Arc::new(store))
    }

    pub fn data_client(&self) -> Result<AuthenticatedClient> {
        Ok(AuthenticatedClient::with_client(
            self.http()?,
            self.config.base_url(),
            self.token_store()?,
        ))
    }
}
