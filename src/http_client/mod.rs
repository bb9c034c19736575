//! HTTP client with direct-then-proxy fallback.
//!
//! Every logical request is tried once without a proxy. If that does not
//! produce a 2xx (and was not rejected as 401/403), it is retried through
//! the CORS proxies held by a shared [`ProxyRegistry`], which is told about
//! every proxy that rate limits or fails.

mod options;
mod response;
mod user_agent;

pub use options::{
    ClientConfig, RequestOptions, DEFAULT_BACKOFF_BASE, DEFAULT_MAX_PROXY_ATTEMPTS,
    DEFAULT_TIMEOUT,
};
pub use response::{HttpResponse, RequestPath};
pub use user_agent::{user_agent_for, BROWSER_USER_AGENTS, USER_AGENT};

use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{AUTHORIZATION, USER_AGENT as USER_AGENT_HEADER};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::proxy::{parse_retry_after, ProxyRegistry, DEFAULT_RATE_LIMIT_SECS};

/// Request client for one set of credentials.
///
/// Cheap to clone; clones share the connection pool and the registry.
#[derive(Clone)]
pub struct ResilientClient {
    client: Client,
    credentials: Credentials,
    registry: Arc<ProxyRegistry>,
    config: ClientConfig,
}

impl ResilientClient {
    /// Create a client with default tunables.
    pub fn new(credentials: Credentials, registry: Arc<ProxyRegistry>) -> Result<Self> {
        Self::with_config(credentials, registry, ClientConfig::default())
    }

    pub fn with_config(
        credentials: Credentials,
        registry: Arc<ProxyRegistry>,
        config: ClientConfig,
    ) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            credentials,
            registry,
            config,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn registry(&self) -> &Arc<ProxyRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// GET a URL.
    pub async fn get(&self, target_url: &str) -> Result<HttpResponse> {
        self.request(target_url, &RequestOptions::get()).await
    }

    /// GET a URL and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, target_url: &str) -> Result<T> {
        self.get(target_url).await?.json().await
    }

    /// Deliver a request, falling back to proxies when the direct path fails.
    pub async fn request(&self, target_url: &str, options: &RequestOptions) -> Result<HttpResponse> {
        validate_target(target_url)?;

        info!(path = "direct", "{} {}", options.method, target_url);
        match self.send(target_url, options, &RequestPath::Direct, 0).await {
            Ok(response) => match response.status() {
                status if status.is_success() => {
                    return Ok(HttpResponse::new(response, RequestPath::Direct, 1));
                }
                StatusCode::UNAUTHORIZED => return Err(Error::Authentication),
                StatusCode::FORBIDDEN => {
                    return Err(Error::Authorization {
                        url: target_url.to_string(),
                    })
                }
                status => {
                    debug!("Direct request returned HTTP {}, trying proxies", status);
                }
            },
            Err(e) if e.is_timeout() => {
                debug!("Direct request timed out, trying proxies");
            }
            Err(e) => {
                debug!("Direct request failed ({}), trying proxies", e);
            }
        }

        self.request_via_proxies(target_url, options).await
    }

    async fn request_via_proxies(
        &self,
        target_url: &str,
        options: &RequestOptions,
    ) -> Result<HttpResponse> {
        let max_attempts = self.config.max_proxy_attempts.min(self.registry.len()) as u32;

        for attempt in 1..=max_attempts {
            let is_last = attempt == max_attempts;
            let Some(proxy) = self.registry.current_proxy() else {
                break;
            };
            let proxied_url = proxy.proxied_url(target_url);
            let path = RequestPath::Proxy {
                base_url: proxy.base_url.clone(),
            };

            info!(
                path = "proxy",
                proxy = %proxy.base_url,
                "{} {} (attempt {}/{})",
                options.method,
                target_url,
                attempt,
                max_attempts
            );

            let started = Instant::now();
            let result = self.send(&proxied_url, options, &path, attempt).await;
            debug!("Proxy {} answered in {:?}", proxy.base_url, started.elapsed());

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(HttpResponse::new(response, path, attempt + 1));
                    }

                    match status {
                        StatusCode::UNAUTHORIZED => return Err(Error::Authentication),
                        StatusCode::FORBIDDEN => {
                            return Err(Error::Authorization {
                                url: target_url.to_string(),
                            })
                        }
                        StatusCode::TOO_MANY_REQUESTS => {
                            let retry_after_secs = parse_retry_after(
                                response
                                    .headers()
                                    .get(reqwest::header::RETRY_AFTER)
                                    .and_then(|v| v.to_str().ok()),
                            )
                            .unwrap_or(DEFAULT_RATE_LIMIT_SECS);

                            self.registry
                                .mark_rate_limited(&proxy.base_url, retry_after_secs);
                            if is_last {
                                return Err(Error::AllProxiesRateLimited { retry_after_secs });
                            }
                        }
                        _ => {
                            self.registry.mark_failed(&proxy.base_url);
                            if is_last {
                                let body = response.text().await.unwrap_or_default();
                                return Err(Error::RequestFailed { status, body });
                            }
                            warn!("Proxy {} returned HTTP {}", proxy.base_url, status);
                        }
                    }
                }
                Err(e) if e.is_timeout() => {
                    self.registry.mark_failed(&proxy.base_url);
                    if is_last {
                        return Err(Error::Timeout {
                            url: target_url.to_string(),
                        });
                    }
                    warn!("Proxy {} timed out", proxy.base_url);
                }
                Err(e) => {
                    self.registry.mark_failed(&proxy.base_url);
                    if is_last {
                        return Err(Error::Network(e));
                    }
                    let backoff = self.config.backoff_base * attempt;
                    warn!(
                        "Proxy {} unreachable ({}), retrying in {:?}",
                        proxy.base_url, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        Err(Error::AllAttemptsFailed {
            attempts: max_attempts + 1,
        })
    }

    /// One HTTP attempt with its own timeout.
    ///
    /// The bearer `Authorization` header is reserved; a caller-supplied one is
    /// dropped. A caller-supplied `User-Agent` replaces the per-path default.
    async fn send(
        &self,
        url: &str,
        options: &RequestOptions,
        path: &RequestPath,
        proxy_attempt: u32,
    ) -> reqwest::Result<Response> {
        let mut request = self
            .client
            .request(options.method.clone(), url)
            .timeout(self.config.timeout)
            .header(AUTHORIZATION, self.credentials.bearer());

        let mut has_user_agent = false;
        for (name, value) in &options.headers {
            if name.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
                debug!("Ignoring caller Authorization header");
                continue;
            }
            has_user_agent |= name.eq_ignore_ascii_case(USER_AGENT_HEADER.as_str());
            request = request.header(name.as_str(), value.as_str());
        }
        if !has_user_agent {
            let user_agent =
                user_agent_for(self.config.user_agent.as_deref(), path, proxy_attempt);
            request = request.header(USER_AGENT_HEADER, user_agent.as_ref());
        }
        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }

        request.send().await
    }
}

/// Reject anything that is not an absolute http(s) URL.
fn validate_target(target_url: &str) -> Result<()> {
    let invalid = |reason: String| Error::InvalidUrl {
        url: target_url.to_string(),
        reason,
    };

    let parsed = Url::parse(target_url).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_target() {
        assert!(validate_target("https://acme.my.salesforce.com/services/data").is_ok());
        assert!(validate_target("http://127.0.0.1:8080/x").is_ok());
        assert!(matches!(
            validate_target("not-a-url"),
            Err(Error::InvalidUrl { .. })
        ));
        assert!(matches!(
            validate_target("/services/data/v58.0/limits"),
            Err(Error::InvalidUrl { .. })
        ));
        assert!(matches!(
            validate_target("ftp://files.example.com/a"),
            Err(Error::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_url_makes_no_attempts() {
        let registry = Arc::new(ProxyRegistry::new());
        let creds = Credentials::new("token", "https://acme.my.salesforce.com").unwrap();
        let client = ResilientClient::new(creds, registry.clone()).unwrap();

        let err = client.get("not-a-url").await.unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
        assert!(registry.status().iter().all(|s| s.reset_at.is_none()));
    }
}
