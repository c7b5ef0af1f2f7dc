use {
    quotebridge_oauth::{RefreshError, TokenStateError},
    thiserror::Error,
};

use crate::quotes::SymbolError;

/// Per-call failure of an authenticated request. Recoverable by the caller.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    NotAuthenticated(#[from] TokenStateError),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("unexpected response: {reason}")]
    MalformedResponse { reason: String, body: String },

    #[error("access token expired and could not be refreshed: {0}")]
    AuthExpired(#[source] RefreshError),

    #[error("{symbol}: {source}")]
    Symbol { symbol: String, source: SymbolError },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
