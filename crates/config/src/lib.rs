//! Settings discovery, env-file persistence and client credentials.

pub mod credentials;
pub mod env_file;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    credentials::{
        ACCESS_TOKEN_KEY, CLIENT_ID_KEY, CLIENT_SECRET_KEY, Credentials, REFRESH_TOKEN_KEY,
        load_credentials,
    },
    env_file::EnvFile,
    error::ConfigError,
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{ApiConfig, OAuthSettings, QuoteBridgeConfig},
};
