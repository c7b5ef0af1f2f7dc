use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

/// OAuth endpoints and registration details for the brokerage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthEndpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

/// The current access/refresh token pair.
///
/// Replaced wholesale by every exchange and refresh; `expires_in` is kept for
/// display only and never drives expiry.
#[derive(Clone)]
pub struct TokenPair {
    pub access_token: Secret<String>,
    pub refresh_token: Secret<String>,
    pub expires_in: Option<u64>,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl TokenPair {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: Option<u64>,
    ) -> Self {
        Self {
            access_token: Secret::new(access_token.into()),
            refresh_token: Secret::new(refresh_token.into()),
            expires_in,
        }
    }

    /// Whether `token` is this pair's access token.
    pub fn has_access_token(&self, token: &str) -> bool {
        self.access_token.expose_secret() == token
    }
}

/// A single-use authorization code from the browser redirect.
///
/// Not `Clone`: the exchange takes it by value.
pub struct AuthorizationCode(Secret<String>);

impl AuthorizationCode {
    /// Returns `None` for a blank code.
    pub fn new(code: impl Into<String>) -> Option<Self> {
        let code = code.into().trim().to_string();
        (!code.is_empty()).then(|| Self(Secret::new(code)))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AuthorizationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthorizationCode([REDACTED])")
    }
}

/// Raw token endpoint response. Every field is optional so a missing one can
/// be reported together with the body instead of as a generic parse error.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_tokens() {
        let pair = TokenPair::new("access-secret", "refresh-secret", Some(1800));
        let out = format!("{pair:?}");
        assert!(!out.contains("access-secret"));
        assert!(!out.contains("refresh-secret"));
        assert!(out.contains("1800"));

        let code = AuthorizationCode::new("code-secret").unwrap();
        assert!(!format!("{code:?}").contains("code-secret"));
    }

    #[test]
    fn blank_code_is_rejected() {
        assert!(AuthorizationCode::new("  ").is_none());
        assert_eq!(AuthorizationCode::new(" abc@ ").unwrap().expose(), "abc@");
    }

    #[test]
    fn token_response_tolerates_missing_fields() {
        let resp: TokenResponse =
            serde_json::from_str(r#"{"access_token":"a","token_type":"Bearer"}"#).unwrap();
        assert_eq!(resp.access_token.as_deref(), Some("a"));
        assert!(resp.refresh_token.is_none());
        assert!(resp.expires_in.is_none());
    }
}
