//! Configuration management for orgscan using the prefer crate.

mod scanner;
mod settings;

pub use scanner::{AlertThreshold, ScannerSettings, MAX_CONCURRENT_SCANS};
pub use settings::{Settings, DEFAULT_RELAY_UPSTREAM};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable with extra comma-separated proxies.
pub const PROXIES_ENV: &str = "ORGSCAN_PROXIES";

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default instance URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_url: Option<String>,
    /// Per-attempt timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Proxy attempts after the direct one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_proxy_attempts: Option<usize>,
    /// Network-error backoff base in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_ms: Option<u64>,
    /// User agent for every request path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// REST API version, e.g. "v58.0".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Custom CORS proxies, tried before the built-in ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proxies: Vec<String>,
    /// Relay upstream when no `url` parameter is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_upstream: Option<String>,
    /// Scanner settings.
    #[serde(default, skip_serializing_if = "ScannerSettings::is_default")]
    pub scanner: ScannerSettings,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults when no config file is found or it fails to parse.
    pub async fn load() -> Self {
        match prefer::load("orgscan").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config file {}: {}", path.display(), e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Format follows the extension: TOML, YAML, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("Failed to parse TOML config: {}", e)))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("Failed to parse YAML config: {}", e)))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| Error::Config(format!("Failed to parse JSON config: {}", e)))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref instance_url) = self.instance_url {
            settings.instance_url = Some(instance_url.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(attempts) = self.max_proxy_attempts {
            settings.max_proxy_attempts = attempts;
        }
        if let Some(backoff) = self.backoff_ms {
            settings.backoff_ms = backoff;
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(ref version) = self.api_version {
            settings.api_version = version.clone();
        }
        if let Some(ref upstream) = self.relay_upstream {
            settings.relay_upstream = upstream.clone();
        }
        settings.add_proxies(&self.proxies);
        settings.scanner = self.scanner.clone();
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
}

/// Load config and resolve settings.
///
/// An explicit config path must load; auto-discovery failures fall back to
/// defaults. `ORGSCAN_PROXIES` adds proxies after the configured ones.
pub async fn load_settings(options: LoadOptions) -> Result<(Settings, Config)> {
    let config = match options.config_path {
        Some(path) => {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
            Config::load_from_path(Path::new(&expanded)).await?
        }
        None => Config::load().await,
    };

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);

    if let Ok(env_proxies) = std::env::var(PROXIES_ENV) {
        tracing::debug!("Using {} from environment: {}", PROXIES_ENV, env_proxies);
        settings.add_proxies(env_proxies.split(','));
    }

    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(ext: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{}", ext))
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_toml() {
        let file = write_config(
            "toml",
            r#"
instance_url = "https://acme.my.salesforce.com"
request_timeout = 10
proxies = ["https://relay.acme.internal/?url="]

[scanner]
autoScan = true
maxConcurrentScans = 5
"#,
        );

        let config = Config::load_from_path(file.path()).await.unwrap();
        assert_eq!(config.request_timeout, Some(10));
        assert!(config.scanner.auto_scan);
        assert_eq!(config.source_path.as_deref(), Some(file.path()));

        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings);
        assert_eq!(settings.request_timeout, 10);
        assert_eq!(settings.max_proxy_attempts, 3);
        assert_eq!(settings.scanner.max_concurrent_scans, 5);
        assert_eq!(settings.proxies, vec!["https://relay.acme.internal/?url="]);
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let yaml = write_config("yaml", "api_version: v60.0\nbackoff_ms: 250\n");
        let config = Config::load_from_path(yaml.path()).await.unwrap();
        assert_eq!(config.api_version.as_deref(), Some("v60.0"));
        assert_eq!(config.backoff_ms, Some(250));

        let json = write_config("json", r#"{"relay_upstream": "https://test.salesforce.com"}"#);
        let config = Config::load_from_path(json.path()).await.unwrap();
        assert_eq!(
            config.relay_upstream.as_deref(),
            Some("https://test.salesforce.com")
        );
    }

    #[tokio::test]
    async fn test_load_invalid_file() {
        let file = write_config("toml", "request_timeout = \"soon\"");
        let err = Config::load_from_path(file.path()).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let missing = Config::load_from_path(Path::new("/nonexistent/orgscan.toml")).await;
        assert!(missing.is_err());
    }

    #[test]
    fn test_default_config_serializes_empty() {
        assert_eq!(Config::default().to_json(), "{}");
    }
}
