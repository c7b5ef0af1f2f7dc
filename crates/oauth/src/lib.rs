pub mod callback;
pub mod defaults;
pub mod error;
pub mod flow;
pub mod storage;
pub mod store;
pub mod types;

pub use {
    callback::parse_authorization_input,
    defaults::load_endpoints,
    error::{AuthExchangeError, RefreshError, TokenStateError},
    flow::OAuthFlow,
    storage::{EnvTokenStorage, TokenStorage},
    store::{CodeSource, TokenStatus, TokenStore},
    types::{AuthorizationCode, OAuthEndpoints, TokenPair},
};
