use {quotebridge_config::ConfigError, thiserror::Error};

/// Failure of the one-time authorization-code exchange. Never retried: the
/// code is single-use.
#[derive(Debug, Error)]
pub enum AuthExchangeError {
    #[error("no authorization code found; paste the full callback URL or the `code` value")]
    MissingCode,

    #[error("could not read the authorization code: {0}")]
    Input(#[source] std::io::Error),

    #[error("token endpoint rejected the authorization code (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("token response (HTTP {status}) is missing {field}: {body}")]
    Malformed {
        status: u16,
        field: &'static str,
        body: String,
    },

    #[error("token request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("tokens obtained but could not be saved: {0}")]
    Persist(#[source] ConfigError),
}

/// Failure of a refresh exchange. Surfaced to the caller as-is; a rejected
/// refresh token needs a fresh authorization.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("no refresh token available; run `quotebridge auth login` to re-authorize")]
    NoRefreshToken,

    #[error("refresh token rejected (HTTP {status}): {body}; run `quotebridge auth login` to re-authorize")]
    Rejected { status: u16, body: String },

    #[error("refresh response (HTTP {status}) is missing {field}: {body}")]
    Malformed {
        status: u16,
        field: &'static str,
        body: String,
    },

    #[error("refresh request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("tokens refreshed but could not be saved: {0}")]
    Persist(#[source] ConfigError),

    #[error("an earlier refresh was rejected; run `quotebridge auth login` to re-authorize")]
    ReauthorizationRequired,
}

/// Reading the current access token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenStateError {
    #[error("not authenticated yet; run `quotebridge auth login`")]
    Uninitialized,

    #[error("token pair is no longer valid; run `quotebridge auth login` to re-authorize")]
    Failed,
}
