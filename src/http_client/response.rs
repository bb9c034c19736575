//! Response wrapper returned by the resilient client.

use std::fmt;

use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Which route delivered a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPath {
    Direct,
    Proxy { base_url: String },
}

impl RequestPath {
    pub fn is_direct(&self) -> bool {
        matches!(self, RequestPath::Direct)
    }
}

impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestPath::Direct => write!(f, "direct"),
            RequestPath::Proxy { base_url } => write!(f, "proxy {}", base_url),
        }
    }
}

/// Successful (2xx) response plus how it was obtained.
pub struct HttpResponse {
    pub status: StatusCode,
    /// Response headers, repeated values kept.
    pub headers: HeaderMap,
    pub via: RequestPath,
    /// Total attempts made, direct one included.
    pub attempts: u32,
    pub(crate) response: Response,
}

impl HttpResponse {
    pub(crate) fn new(response: Response, via: RequestPath, attempts: u32) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            via,
            attempts,
            response,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Every value of a repeated header, in arrival order.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Salesforce reports org-wide API usage as `api-usage=used/limit`.
    pub fn api_usage(&self) -> Option<(u64, u64)> {
        let value = self.header("sforce-limit-info")?;
        let usage = value
            .split(',')
            .find_map(|part| part.trim().strip_prefix("api-usage="))?;
        let (used, limit) = usage.split_once('/')?;
        Some((used.trim().parse().ok()?, limit.trim().parse().ok()?))
    }

    pub async fn text(self) -> Result<String> {
        Ok(self.response.text().await?)
    }

    pub async fn bytes(self) -> Result<Vec<u8>> {
        Ok(self.response.bytes().await.map(|b| b.to_vec())?)
    }

    /// Decode the body as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.response.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Decode(e.to_string()))
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("via", &self.via)
            .field("attempts", &self.attempts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path_display() {
        assert_eq!(RequestPath::Direct.to_string(), "direct");
        assert_eq!(
            RequestPath::Proxy {
                base_url: "https://corsproxy.io/?".to_string()
            }
            .to_string(),
            "proxy https://corsproxy.io/?"
        );
    }
}
