//! In-memory owner of the current token pair.
//!
//! ```text
//! Uninitialized --exchange--> Active --refresh ok--> Active
//!                               |
//!                               +--refresh rejected--> Failed --exchange--> Active
//! ```
//!
//! Refreshes are serialized: callers that hit a 401 with a token that has
//! already been replaced get the current token instead of starting a second
//! refresh.

use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use {
    async_trait::async_trait,
    quotebridge_config::ConfigError,
    secrecy::Secret,
    tokio::sync::Mutex,
    tracing::{debug, info, warn},
};

use crate::{
    callback::parse_authorization_input,
    error::{AuthExchangeError, RefreshError, TokenStateError},
    flow::OAuthFlow,
    storage::TokenStorage,
    types::{AuthorizationCode, TokenPair},
};

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Uninitialized,
    Active,
    Failed,
}

enum TokenState {
    Uninitialized,
    Active(TokenPair),
    Failed,
}

/// The human-in-the-loop step: show the authorization URL, return whatever
/// the operator pastes back (callback URL or raw code).
#[async_trait]
pub trait CodeSource: Send + Sync {
    async fn authorization_input(&self, authorization_url: &str) -> std::io::Result<String>;
}

pub struct TokenStore {
    flow: OAuthFlow,
    storage: Box<dyn TokenStorage>,
    state: RwLock<TokenState>,
    refresh_gate: Mutex<()>,
}

impl TokenStore {
    /// An empty store; the first exchange activates it.
    pub fn new(flow: OAuthFlow, storage: impl TokenStorage + 'static) -> Self {
        Self {
            flow,
            storage: Box::new(storage),
            state: RwLock::new(TokenState::Uninitialized),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Start from the persisted pair, if there is one.
    pub fn restore(
        flow: OAuthFlow,
        storage: impl TokenStorage + 'static,
    ) -> Result<Self, ConfigError> {
        let persisted = storage.load()?;
        let store = Self::new(flow, storage);
        if let Some(pair) = persisted {
            debug!("restored persisted token pair");
            store.set_state(TokenState::Active(pair));
        }
        Ok(store)
    }

    pub fn status(&self) -> TokenStatus {
        match &*self.read_state() {
            TokenState::Uninitialized => TokenStatus::Uninitialized,
            TokenState::Active(_) => TokenStatus::Active,
            TokenState::Failed => TokenStatus::Failed,
        }
    }

    /// The current access token. Never triggers I/O.
    pub fn access_token(&self) -> Result<Secret<String>, TokenStateError> {
        match &*self.read_state() {
            TokenState::Uninitialized => Err(TokenStateError::Uninitialized),
            TokenState::Active(pair) => Ok(pair.access_token.clone()),
            TokenState::Failed => Err(TokenStateError::Failed),
        }
    }

    pub fn authorization_url(&self) -> String {
        self.flow.authorization_url()
    }

    /// Exchange a code for the initial pair and persist it.
    ///
    /// On failure the state is left as it was. If only saving fails, the new
    /// pair is already current in memory and `Persist` is returned.
    pub async fn exchange_authorization_code(
        &self,
        code: AuthorizationCode,
    ) -> Result<TokenPair, AuthExchangeError> {
        let _gate = self.refresh_gate.lock().await;
        let pair = self.flow.exchange(code).await?;
        self.set_state(TokenState::Active(pair.clone()));
        info!("token store active");
        self.storage
            .save(&pair)
            .map_err(AuthExchangeError::Persist)?;
        Ok(pair)
    }

    /// Run the interactive step through `source`, then exchange the code.
    pub async fn authorize(&self, source: &dyn CodeSource) -> Result<TokenPair, AuthExchangeError> {
        let url = self.authorization_url();
        let input = source
            .authorization_input(&url)
            .await
            .map_err(AuthExchangeError::Input)?;
        let code = parse_authorization_input(&input)?;
        self.exchange_authorization_code(code).await
    }

    /// Refresh on demand and persist the new pair.
    pub async fn refresh(&self) -> Result<TokenPair, RefreshError> {
        let _gate = self.refresh_gate.lock().await;
        let pair = self.refresh_locked().await?;
        self.storage.save(&pair).map_err(RefreshError::Persist)?;
        Ok(pair)
    }

    /// Refresh because `stale_access_token` was rejected, unless another
    /// caller already replaced it. Returns the access token to retry with.
    ///
    /// A failure to save the refreshed pair is logged, not returned: the new
    /// token is live and the old one is already dead.
    pub async fn refresh_after(&self, stale_access_token: &str) -> Result<Secret<String>, RefreshError> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.rotated_since(stale_access_token) {
            debug!("access token already refreshed by another caller");
            return Ok(current);
        }

        let pair = self.refresh_locked().await?;
        if let Err(e) = self.storage.save(&pair) {
            warn!(error = %e, "refreshed tokens could not be saved");
        }
        Ok(pair.access_token)
    }

    /// Caller must hold `refresh_gate`.
    async fn refresh_locked(&self) -> Result<TokenPair, RefreshError> {
        let refresh_token = match &*self.read_state() {
            TokenState::Uninitialized => return Err(RefreshError::NoRefreshToken),
            TokenState::Failed => return Err(RefreshError::ReauthorizationRequired),
            TokenState::Active(pair) => pair.refresh_token.clone(),
        };

        match self.flow.refresh(&refresh_token).await {
            Ok(pair) => {
                self.set_state(TokenState::Active(pair.clone()));
                Ok(pair)
            },
            Err(err) => {
                if let RefreshError::Rejected { status, .. } = &err
                    && (400..500).contains(status)
                {
                    warn!(status, "refresh token rejected, re-authorization required");
                    self.set_state(TokenState::Failed);
                }
                Err(err)
            },
        }
    }

    fn rotated_since(&self, stale_access_token: &str) -> Option<Secret<String>> {
        match &*self.read_state() {
            TokenState::Active(pair) if !pair.has_access_token(stale_access_token) => {
                Some(pair.access_token.clone())
            },
            _ => None,
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, TokenState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: TokenState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}
