//! Per-request options and client tunables.

use std::time::Duration;

use reqwest::Method;
use serde::Serialize;

use crate::error::{Error, Result};

/// Per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Proxy attempts after the direct one, further capped by the proxy count.
pub const DEFAULT_MAX_PROXY_ATTEMPTS: usize = 3;

/// Network errors back off `backoff_base * attempt`.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(1000);

/// Tunables for [`super::ResilientClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub max_proxy_attempts: usize,
    pub backoff_base: Duration,
    /// Sent on every path when set. See [`super::user_agent_for`].
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_proxy_attempts: DEFAULT_MAX_PROXY_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
            user_agent: None,
        }
    }
}

/// Method, headers and body for one logical request.
///
/// The bearer `Authorization` header is added by the client and cannot be
/// overridden here.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value).map_err(|e| Error::Decode(e.to_string()))?;
        Ok(self.header("Content-Type", "application/json").body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_proxy_attempts, 3);

        let options = RequestOptions::get();
        assert_eq!(options.method, Method::GET);
        assert!(options.body.is_none());
    }

    #[test]
    fn test_json_body() {
        let options = RequestOptions::new(Method::POST)
            .json(&serde_json::json!({"q": "SELECT Id FROM User"}))
            .unwrap();
        assert_eq!(
            options.headers,
            vec![("Content-Type".to_string(), "application/json".to_string())]
        );
        assert_eq!(
            options.body.as_deref(),
            Some(br#"{"q":"SELECT Id FROM User"}"#.as_slice())
        );
    }
}
