//! Scanner settings shared with the dashboard.
//!
//! Field names are camelCase to match the settings object the web app and
//! extension persist.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum parallel scans the scanner will accept.
pub const MAX_CONCURRENT_SCANS: u32 = 10;

/// Minimum finding severity that raises an alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertThreshold {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl fmt::Display for AlertThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertThreshold::Low => "low",
            AlertThreshold::Medium => "medium",
            AlertThreshold::High => "high",
            AlertThreshold::Critical => "critical",
        };
        f.write_str(s)
    }
}

impl FromStr for AlertThreshold {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(AlertThreshold::Low),
            "medium" => Ok(AlertThreshold::Medium),
            "high" => Ok(AlertThreshold::High),
            "critical" => Ok(AlertThreshold::Critical),
            other => Err(Error::Config(format!("unknown alert threshold '{}'", other))),
        }
    }
}

/// Scanner behaviour settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScannerSettings {
    pub auto_scan: bool,
    /// Minutes between automatic scans.
    pub scan_interval: u32,
    pub notifications: bool,
    pub real_time_monitoring: bool,
    pub alert_threshold: AlertThreshold,
    /// Days to keep scan results.
    pub data_retention: u32,
    pub encrypt_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
    pub sync_with_web_app: bool,
    pub debug_mode: bool,
    pub max_concurrent_scans: u32,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            auto_scan: false,
            scan_interval: 60,
            notifications: true,
            real_time_monitoring: false,
            alert_threshold: AlertThreshold::Medium,
            data_retention: 30,
            encrypt_data: true,
            api_endpoint: None,
            sync_with_web_app: true,
            debug_mode: false,
            max_concurrent_scans: 3,
        }
    }
}

impl ScannerSettings {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.scan_interval == 0 {
            return Err(Error::Config("scanInterval must be at least 1 minute".into()));
        }
        if self.data_retention == 0 {
            return Err(Error::Config("dataRetention must be at least 1 day".into()));
        }
        if !(1..=MAX_CONCURRENT_SCANS).contains(&self.max_concurrent_scans) {
            return Err(Error::Config(format!(
                "maxConcurrentScans must be between 1 and {}",
                MAX_CONCURRENT_SCANS
            )));
        }
        if let Some(endpoint) = &self.api_endpoint {
            let parsed = url::Url::parse(endpoint)
                .map_err(|e| Error::Config(format!("apiEndpoint '{}': {}", endpoint, e)))?;
            if parsed.scheme() != "https" {
                return Err(Error::Config(format!(
                    "apiEndpoint '{}' must use https",
                    endpoint
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_take_defaults() {
        let settings: ScannerSettings =
            serde_json::from_str(r#"{"autoScan": true, "alertThreshold": "high", "unknown": 1}"#)
                .unwrap();
        assert!(settings.auto_scan);
        assert_eq!(settings.alert_threshold, AlertThreshold::High);
        assert_eq!(settings.scan_interval, 60);
        assert_eq!(settings.max_concurrent_scans, 3);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(ScannerSettings::default()).unwrap();
        assert_eq!(json["realTimeMonitoring"], false);
        assert_eq!(json["syncWithWebApp"], true);
        assert_eq!(json["alertThreshold"], "medium");
        assert!(json.get("apiEndpoint").is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            ScannerSettings {
                scan_interval: 0,
                ..Default::default()
            },
            ScannerSettings {
                data_retention: 0,
                ..Default::default()
            },
            ScannerSettings {
                max_concurrent_scans: 11,
                ..Default::default()
            },
            ScannerSettings {
                api_endpoint: Some("http://scanner.example.com".into()),
                ..Default::default()
            },
        ];
        for settings in bad {
            assert!(settings.validate().is_err(), "{:?}", settings);
        }
    }

    #[test]
    fn test_alert_threshold_order() {
        assert!(AlertThreshold::Critical > AlertThreshold::High);
        assert_eq!("HIGH".parse::<AlertThreshold>().unwrap(), AlertThreshold::High);
        assert!("severe".parse::<AlertThreshold>().is_err());
    }
}
