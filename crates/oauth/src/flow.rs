//! Authorization URL, code exchange and refresh against the token endpoint.
//!
//! Both grants authenticate the client with an HTTP Basic header
//! (`base64(client_id:client_secret)`) and send the grant parameters as a
//! form body. Client credentials never go in the body.

use {
    base64::{Engine, engine::general_purpose::STANDARD},
    quotebridge_config::Credentials,
    reqwest::{Client, header::AUTHORIZATION},
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, info, warn},
    url::form_urlencoded,
};

use crate::{
    error::{AuthExchangeError, RefreshError},
    types::{AuthorizationCode, OAuthEndpoints, TokenPair, TokenResponse},
};

pub struct OAuthFlow {
    client: Client,
    endpoints: OAuthEndpoints,
    credentials: Credentials,
}

impl OAuthFlow {
    pub fn new(endpoints: OAuthEndpoints, credentials: Credentials) -> Self {
        Self::with_client(Client::new(), endpoints, credentials)
    }

    /// Use a preconfigured client (timeouts, proxies).
    pub fn with_client(client: Client, endpoints: OAuthEndpoints, credentials: Credentials) -> Self {
        Self {
            client,
            endpoints,
            credentials,
        }
    }

    /// The URL the operator opens to authorize the app.
    ///
    /// `redirect_uri` is passed through verbatim since the brokerage compares
    /// it literally against the registered callback; scopes are joined with
    /// `%20`.
    pub fn authorization_url(&self) -> String {
        let scope = self
            .endpoints
            .scopes
            .iter()
            .map(|s| encode(s))
            .collect::<Vec<_>>()
            .join("%20");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={scope}",
            self.endpoints.authorize_url,
            encode(self.credentials.client_id()),
            self.endpoints.redirect_uri,
        )
    }

    /// `Authorization` header value for the token endpoint.
    pub fn basic_authorization(&self) -> String {
        let raw = format!(
            "{}:{}",
            self.credentials.client_id(),
            self.credentials.client_secret().expose_secret()
        );
        format!("Basic {}", STANDARD.encode(raw))
    }

    /// Exchange a single-use authorization code for the initial token pair.
    pub async fn exchange(&self, code: AuthorizationCode) -> Result<TokenPair, AuthExchangeError> {
        debug!(token_url = %self.endpoints.token_url, "exchanging authorization code");

        let resp = self
            .client
            .post(&self.endpoints.token_url)
            .header(AUTHORIZATION, self.basic_authorization())
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code.expose()),
                ("redirect_uri", self.endpoints.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(AuthExchangeError::Transport)?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(AuthExchangeError::Transport)?;
        if !resp_ok(status) {
            warn!(status, "authorization code exchange rejected");
            return Err(AuthExchangeError::Rejected { status, body });
        }

        let malformed = |field| AuthExchangeError::Malformed {
            status,
            field,
            body: body.clone(),
        };
        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|_| malformed("a JSON object"))?;
        let access = non_empty(parsed.access_token).ok_or_else(|| malformed("access_token"))?;
        let refresh = non_empty(parsed.refresh_token).ok_or_else(|| malformed("refresh_token"))?;

        info!(expires_in = ?parsed.expires_in, "authorization code exchanged");
        Ok(TokenPair::new(access, refresh, parsed.expires_in))
    }

    /// Trade a refresh token for a new pair. When the response carries no
    /// `refresh_token`, the one passed in is kept.
    pub async fn refresh(&self, refresh_token: &Secret<String>) -> Result<TokenPair, RefreshError> {
        debug!(token_url = %self.endpoints.token_url, "refreshing access token");

        let resp = self
            .client
            .post(&self.endpoints.token_url)
            .header(AUTHORIZATION, self.basic_authorization())
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.expose_secret().as_str()),
            ])
            .send()
            .await
            .map_err(RefreshError::Transport)?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(RefreshError::Transport)?;
        if !resp_ok(status) {
            warn!(status, "refresh rejected");
            return Err(RefreshError::Rejected { status, body });
        }

        let malformed = |field| RefreshError::Malformed {
            status,
            field,
            body: body.clone(),
        };
        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|_| malformed("a JSON object"))?;
        let access = non_empty(parsed.access_token).ok_or_else(|| malformed("access_token"))?;

        let rotated = non_empty(parsed.refresh_token);
        debug!(rotated = rotated.is_some(), "refresh token rotation");
        let refresh = rotated.unwrap_or_else(|| refresh_token.expose_secret().clone());

        info!(expires_in = ?parsed.expires_in, "access token refreshed");
        Ok(TokenPair::new(access, refresh, parsed.expires_in))
    }
}

fn resp_ok(status: u16) -> bool {
    (200..300).contains(&status)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
