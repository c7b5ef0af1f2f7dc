use url::{Url, form_urlencoded};

use crate::{error::AuthExchangeError, types::AuthorizationCode};

/// Extract the authorization code from what the operator pasted.
///
/// Accepts the full callback URL (`https://…/callback?code=…&session=…`), a
/// bare query string (`?code=…&session=…`), or the raw code. Percent-encoded
/// codes (`…%40`) are decoded.
pub fn parse_authorization_input(input: &str) -> Result<AuthorizationCode, AuthExchangeError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AuthExchangeError::MissingCode);
    }

    if let Ok(url) = Url::parse(input)
        && matches!(url.scheme(), "http" | "https")
    {
        return url
            .query_pairs()
            .find(|(k, _)| k == "code")
            .and_then(|(_, v)| AuthorizationCode::new(v.into_owned()))
            .ok_or(AuthExchangeError::MissingCode);
    }

    let query = input.rsplit_once('?').map_or(input, |(_, q)| q);
    if query.starts_with("code=") || query.contains("&code=") {
        return code_from_query(query).ok_or(AuthExchangeError::MissingCode);
    }

    if input.contains('%') {
        let escaped = format!("code={}", input.replace('+', "%2B"));
        return code_from_query(&escaped).ok_or(AuthExchangeError::MissingCode);
    }

    AuthorizationCode::new(input).ok_or(AuthExchangeError::MissingCode)
}

fn code_from_query(query: &str) -> Option<AuthorizationCode> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "code")
        .and_then(|(_, v)| AuthorizationCode::new(v.into_owned()))
}
