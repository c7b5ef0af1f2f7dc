//! Authenticated request execution with a single refresh-and-retry on 401.

use std::sync::Arc;

use {
    quotebridge_oauth::TokenStore,
    reqwest::{Client, Method, Response, StatusCode},
    secrecy::ExposeSecret,
    serde::de::DeserializeOwned,
    tracing::{debug, warn},
};

use crate::error::RequestError;

/// A data-API call, relative to the executor's base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Sends requests with the store's current access token.
///
/// A 401 triggers one refresh through [`TokenStore::refresh_after`] and one
/// retry with the new token. A second 401 is returned as-is.
#[derive(Clone)]
pub struct AuthenticatedClient {
    http: Client,
    base_url: String,
    tokens: Arc<TokenStore>,
}

impl AuthenticatedClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<TokenStore>) -> Self {
        Self::with_client(Client::new(), base_url, tokens)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>, tokens: Arc<TokenStore>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            tokens,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub async fn execute<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, RequestError> {
        let token = self.tokens.access_token()?;
        let resp = self.send(request, token.expose_secret()).await?;

        let resp = if resp.status() == StatusCode::UNAUTHORIZED {
            debug!(path = %request.path, "access token rejected, refreshing");
            let fresh = self
                .tokens
                .refresh_after(token.expose_secret())
                .await
                .map_err(RequestError::AuthExpired)?;
            let retried = self.send(request, fresh.expose_secret()).await?;
            if retried.status() == StatusCode::UNAUTHORIZED {
                warn!(path = %request.path, "request still unauthorized after refresh");
            }
            retried
        } else {
            resp
        };

        decode(resp).await
    }

    async fn send(&self, request: &ApiRequest, access_token: &str) -> Result<Response, RequestError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .bearer_auth(access_token);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        // `json` sets the content type; bodiless requests carry none.
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder.send().await.map_err(RequestError::Transport)
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, RequestError> {
    let status = resp.status();
    let body = resp.text().await.map_err(RequestError::Transport)?;
    if !status.is_success() {
        return Err(RequestError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|e| RequestError::MalformedResponse {
        reason: e.to_string(),
        body,
    })
}
