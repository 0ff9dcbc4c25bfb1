//! HTTP API client with bearer-token auth.
//!
//! Thin wrapper over `reqwest` that attaches the session credential to each
//! request and maps failures to [`ApiError`]. A 401 from any endpoint clears
//! the session credential before surfacing [`ApiError::Unauthorized`].

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use watchpost_shared::ApiError;

use crate::session::Session;

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Session) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut rb = self.client.request(method, self.url(path));
        if let Some(token) = self.session.token() {
            rb = rb.bearer_auth(token);
        }
        rb
    }

    async fn dispatch<TRes: DeserializeOwned>(&self, rb: RequestBuilder) -> Result<TRes, ApiError> {
        let resp = rb
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read body: {e}")))?;

        if status.as_u16() == 401 {
            // Credential is no longer valid for any call; drop it so the
            // next login starts clean.
            self.session.clear();
            return Err(ApiError::Unauthorized(text));
        }
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let body = if text.is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(body).map_err(|e| ApiError::Deserialize(e.to_string()))
    }

    pub async fn get_json<TRes: DeserializeOwned>(&self, path: &str) -> Result<TRes, ApiError> {
        self.dispatch(self.request(Method::GET, path)).await
    }

    pub async fn post_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        self.dispatch(self.request(Method::POST, path).json(body))
            .await
    }

    /// POST with no request body, for action endpoints like
    /// `/{id}/acknowledge`.
    pub async fn post_action<TRes: DeserializeOwned>(&self, path: &str) -> Result<TRes, ApiError> {
        self.dispatch(self.request(Method::POST, path)).await
    }

    pub async fn put_json<TReq: Serialize, TRes: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TRes, ApiError> {
        self.dispatch(self.request(Method::PUT, path).json(body))
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.dispatch::<()>(self.request(Method::DELETE, path)).await
    }
}
