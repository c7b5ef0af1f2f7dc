use std::path::PathBuf;

use thiserror::Error;

/// Startup failures: missing credentials or an unusable env file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set; add it to the env file or export it")]
    MissingCredential(&'static str),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}
