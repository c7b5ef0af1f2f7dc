use {
    quotebridge_config::{ACCESS_TOKEN_KEY, ConfigError, EnvFile, REFRESH_TOKEN_KEY},
    secrecy::ExposeSecret,
};

use crate::types::TokenPair;

/// Durable storage for the current token pair.
pub trait TokenStorage: Send + Sync {
    /// The persisted pair, if both tokens are present.
    fn load(&self) -> Result<Option<TokenPair>, ConfigError>;

    fn save(&self, tokens: &TokenPair) -> Result<(), ConfigError>;
}

/// Keeps the pair in the env file as `SCHWAB_ACCESS_TOKEN` and
/// `SCHWAB_REFRESH_TOKEN`, next to the client credentials.
#[derive(Debug, Clone)]
pub struct EnvTokenStorage {
    file: EnvFile,
}

impl EnvTokenStorage {
    pub fn new(file: EnvFile) -> Self {
        Self { file }
    }
}

impl TokenStorage for EnvTokenStorage {
    fn load(&self) -> Result<Option<TokenPair>, ConfigError> {
        let access = self.file.get(ACCESS_TOKEN_KEY)?;
        let refresh = self.file.get(REFRESH_TOKEN_KEY)?;
        Ok(match (access, refresh) {
            (Some(access), Some(refresh)) => Some(TokenPair::new(access, refresh, None)),
            _ => None,
        })
    }

    fn save(&self, tokens: &TokenPair) -> Result<(), ConfigError> {
        self.file.update(&[
            (ACCESS_TOKEN_KEY, tokens.access_token.expose_secret().as_str()),
            (REFRESH_TOKEN_KEY, tokens.refresh_token.expose_secret().as_str()),
        ])
    }
}
