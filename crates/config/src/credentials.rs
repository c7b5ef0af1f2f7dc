use secrecy::Secret;

use crate::{env_file::EnvFile, error::ConfigError};

pub const CLIENT_ID_KEY: &str = "SCHWAB_CLIENT_ID";
pub const CLIENT_SECRET_KEY: &str = "SCHWAB_CLIENT_SECRET";
pub const ACCESS_TOKEN_KEY: &str = "SCHWAB_ACCESS_TOKEN";
pub const REFRESH_TOKEN_KEY: &str = "SCHWAB_REFRESH_TOKEN";

/// Registered application credentials. Loaded once, never mutated.
#[derive(Clone)]
pub struct Credentials {
    client_id: String,
    client_secret: Secret<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Both values must be non-blank.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let client_id = client_id.into().trim().to_string();
        let client_secret = client_secret.into().trim().to_string();
        if client_id.is_empty() {
            return Err(ConfigError::MissingCredential(CLIENT_ID_KEY));
        }
        if client_secret.is_empty() {
            return Err(ConfigError::MissingCredential(CLIENT_SECRET_KEY));
        }
        Ok(Self {
            client_id,
            client_secret: Secret::new(client_secret),
        })
    }

    /// Build from any key lookup (process env, env file, a test map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let id = lookup(CLIENT_ID_KEY).ok_or(ConfigError::MissingCredential(CLIENT_ID_KEY))?;
        let secret =
            lookup(CLIENT_SECRET_KEY).ok_or(ConfigError::MissingCredential(CLIENT_SECRET_KEY))?;
        Self::new(id, secret)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &Secret<String> {
        &self.client_secret
    }

    /// Short prefix of the client id for operator-facing output.
    pub fn client_id_hint(&self) -> String {
        let prefix: String = self.client_id.chars().take(8).collect();
        if prefix.len() < self.client_id.len() {
            format!("{prefix}...")
        } else {
            prefix
        }
    }
}

/// Load credentials: exported variables win over the env file.
pub fn load_credentials(env_file: &EnvFile) -> Result<Credentials, ConfigError> {
    let file = env_file.read()?;
    Credentials::from_lookup(|key| {
        std::env::var(key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| file.get(key).cloned())
    })
}
