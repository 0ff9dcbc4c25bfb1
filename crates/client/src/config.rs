//! Client configuration.

use crate::ws::RetryPolicy;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Path of the dashboard stream endpoint.
    pub stream_path: String,
    /// Reconnect policy for the stream channel.
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            stream_path: "/api/v1/ws/dashboard".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Read the backend URL from `WATCHPOST_URL`, falling back to the
    /// default local address.
    pub fn from_env() -> Self {
        match std::env::var("WATCHPOST_URL") {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// WebSocket URL for the stream endpoint, with the session credential
    /// (when present) attached to the handshake.
    pub fn stream_url(&self, token: Option<&str>) -> String {
        let base = http_to_ws(self.base_url.trim_end_matches('/'));
        let mut url = format!("{}{}", base, self.stream_path);
        if let Some(token) = token {
            url.push_str("?token=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }
}

fn http_to_ws(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_url_swaps_scheme_and_appends_token() {
        let config = ClientConfig::new("https://ops.example.com/");
        assert_eq!(
            config.stream_url(None),
            "wss://ops.example.com/api/v1/ws/dashboard"
        );
        assert_eq!(
            config.stream_url(Some("a b")),
            "wss://ops.example.com/api/v1/ws/dashboard?token=a%20b"
        );
    }
}
