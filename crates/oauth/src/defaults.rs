use quotebridge_config::QuoteBridgeConfig;

use crate::types::OAuthEndpoints;

/// Resolve the OAuth endpoints from the loaded settings.
///
/// The authorize and token URLs default to `{base_url}/v1/oauth/*` unless the
/// settings override them.
pub fn load_endpoints(config: &QuoteBridgeConfig) -> OAuthEndpoints {
    OAuthEndpoints {
        authorize_url: config.authorize_url(),
        token_url: config.token_url(),
        redirect_uri: config.oauth.redirect_uri.clone(),
        scopes: config.oauth.scopes.clone(),
    }
}
