//! Resolved runtime settings.

use std::sync::Arc;
use std::time::Duration;

use crate::http_client::{
    ClientConfig, DEFAULT_BACKOFF_BASE, DEFAULT_MAX_PROXY_ATTEMPTS, DEFAULT_TIMEOUT,
};
use crate::proxy::ProxyRegistry;
use crate::salesforce::DEFAULT_API_VERSION;

use super::scanner::ScannerSettings;

/// Upstream the relay forwards to when no `url` parameter is given.
pub const DEFAULT_RELAY_UPSTREAM: &str = "https://login.salesforce.com";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Default org for CLI commands.
    pub instance_url: Option<String>,
    /// Per-attempt timeout in seconds.
    pub request_timeout: u64,
    pub max_proxy_attempts: usize,
    /// Base of the linear network-error backoff, in milliseconds.
    pub backoff_ms: u64,
    pub user_agent: Option<String>,
    pub api_version: String,
    /// Custom proxies, highest priority first.
    pub proxies: Vec<String>,
    pub relay_upstream: String,
    pub scanner: ScannerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            instance_url: None,
            request_timeout: DEFAULT_TIMEOUT.as_secs(),
            max_proxy_attempts: DEFAULT_MAX_PROXY_ATTEMPTS,
            backoff_ms: DEFAULT_BACKOFF_BASE.as_millis() as u64,
            user_agent: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            proxies: Vec::new(),
            relay_upstream: DEFAULT_RELAY_UPSTREAM.to_string(),
            scanner: ScannerSettings::default(),
        }
    }
}

impl Settings {
    /// Client tunables derived from these settings.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.request_timeout),
            max_proxy_attempts: self.max_proxy_attempts,
            backoff_base: Duration::from_millis(self.backoff_ms),
            user_agent: self.user_agent.clone(),
        }
    }

    /// Known proxies with the custom ones in front, in listed order.
    pub fn build_registry(&self) -> Arc<ProxyRegistry> {
        let registry = ProxyRegistry::new();
        for proxy in self.proxies.iter().rev() {
            registry.add_custom_proxy(proxy);
        }
        Arc::new(registry)
    }

    /// Append proxies, skipping ones already listed.
    pub fn add_proxies<I, S>(&mut self, proxies: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for proxy in proxies {
            let proxy = proxy.as_ref().trim();
            if !proxy.is_empty() && !self.proxies.iter().any(|p| p == proxy) {
                self.proxies.push(proxy.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::KNOWN_PROXIES;

    #[test]
    fn test_client_config_from_settings() {
        let settings = Settings {
            request_timeout: 5,
            backoff_ms: 10,
            ..Default::default()
        };
        let config = settings.client_config();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.backoff_base, Duration::from_millis(10));
        assert_eq!(config.max_proxy_attempts, 3);
    }

    #[test]
    fn test_registry_custom_proxies_first() {
        let mut settings = Settings::default();
        settings.add_proxies([
            "https://first.example/?url=",
            "https://second.example/?url=",
            "https://first.example/?url=",
        ]);
        assert_eq!(settings.proxies.len(), 2);

        let registry = settings.build_registry();
        let status = registry.status();
        assert_eq!(status.len(), KNOWN_PROXIES.len() + 2);
        assert_eq!(status[0].base_url, "https://first.example/?url=");
        assert_eq!(status[1].base_url, "https://second.example/?url=");
        assert_eq!(
            registry.current_proxy().unwrap().base_url,
            "https://first.example/?url="
        );
    }
}
