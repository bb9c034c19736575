//! Shared catalog of CORS proxies with temporary exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::style::{ProxyStyle, KNOWN_PROXIES};

/// Exclusion applied by [`ProxyRegistry::mark_rate_limited`] when the proxy
/// sent no usable `Retry-After`.
pub const DEFAULT_RATE_LIMIT_SECS: u64 = 3600;

/// Exclusion applied by [`ProxyRegistry::mark_failed`].
pub const FAILURE_EXCLUSION_SECS: u64 = 300;

/// Upper bound on any exclusion window (one week).
const MAX_EXCLUSION_SECS: u64 = 7 * 24 * 3600;

/// A proxy the client can route through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEntry {
    pub base_url: String,
    pub style: ProxyStyle,
}

impl ProxyEntry {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let style = ProxyStyle::for_base(&base_url);
        Self { base_url, style }
    }

    /// URL that fetches `target_url` through this proxy.
    pub fn proxied_url(&self, target_url: &str) -> String {
        self.style.format(&self.base_url, target_url)
    }
}

/// Point-in-time view of one proxy.
#[derive(Debug, Clone, Serialize)]
pub struct ProxyStatus {
    pub base_url: String,
    pub style: ProxyStyle,
    pub rate_limited: bool,
    pub reset_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: Vec<ProxyEntry>,
    /// base_url -> time the exclusion ends
    excluded: HashMap<String, DateTime<Utc>>,
    cursor: usize,
}

impl RegistryState {
    fn position(&self, base_url: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.base_url == base_url)
    }

    fn is_excluded(&self, base_url: &str, now: DateTime<Utc>) -> bool {
        self.excluded
            .get(base_url)
            .is_some_and(|reset_at| now < *reset_at)
    }
}

/// Ordered proxy list with rotation cursor and per-proxy exclusion.
///
/// Shared by reference (`Arc`) between every client that should see the
/// same rate-limit bookkeeping. All methods are synchronous and the lock is
/// never held across an await point.
pub struct ProxyRegistry {
    state: Mutex<RegistryState>,
    clock: Arc<dyn Clock>,
}

impl ProxyRegistry {
    /// Registry seeded with the known public proxies.
    pub fn new() -> Self {
        Self::with_proxies(KNOWN_PROXIES.iter().map(|p| p.base_url))
    }

    /// Registry with an explicit proxy list, in rotation order.
    pub fn with_proxies<I, S>(proxies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries: Vec<ProxyEntry> = Vec::new();
        for base in proxies {
            let entry = ProxyEntry::new(base);
            if !entries.iter().any(|e| e.base_url == entry.base_url) {
                entries.push(entry);
            }
        }

        Self {
            state: Mutex::new(RegistryState {
                entries,
                ..Default::default()
            }),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of proxies, excluded or not.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pick the next usable proxy.
    ///
    /// Expired exclusions are dropped first. Scans from the cursor for the
    /// first proxy that is not excluded and moves the cursor there. When
    /// every proxy is excluded the first one is returned anyway. `None` only
    /// for an empty registry.
    pub fn current_proxy(&self) -> Option<ProxyEntry> {
        let now = self.clock.now();
        let mut state = self.lock();

        state.excluded.retain(|base_url, reset_at| {
            let keep = now < *reset_at;
            if !keep {
                debug!("Proxy {} exclusion expired", base_url);
            }
            keep
        });

        let len = state.entries.len();
        if len == 0 {
            return None;
        }

        let start = state.cursor % len;
        for offset in 0..len {
            let idx = (start + offset) % len;
            if !state.is_excluded(&state.entries[idx].base_url, now) {
                state.cursor = idx;
                return Some(state.entries[idx].clone());
            }
        }

        warn!("All {} proxies are excluded, using the first one", len);
        Some(state.entries[0].clone())
    }

    /// Exclude a proxy for `retry_after_secs` and rotate past it.
    pub fn mark_rate_limited(&self, base_url: &str, retry_after_secs: u64) {
        if self.exclude(base_url, retry_after_secs) {
            warn!(
                "Proxy {} rate limited, excluded for {}s",
                base_url, retry_after_secs
            );
        }
    }

    /// Exclude a proxy for the short failure window and rotate past it.
    pub fn mark_failed(&self, base_url: &str) {
        if self.exclude(base_url, FAILURE_EXCLUSION_SECS) {
            warn!(
                "Proxy {} failed, excluded for {}s",
                base_url, FAILURE_EXCLUSION_SECS
            );
        }
    }

    fn exclude(&self, base_url: &str, secs: u64) -> bool {
        let secs = secs.min(MAX_EXCLUSION_SECS) as i64;
        let reset_at = self.clock.now() + Duration::seconds(secs);

        let mut state = self.lock();
        let Some(idx) = state.position(base_url) else {
            debug!("Ignoring exclusion for unknown proxy {}", base_url);
            return false;
        };

        state.excluded.insert(base_url.to_string(), reset_at);
        state.cursor = (idx + 1) % state.entries.len();
        true
    }

    /// Put a caller-supplied proxy at the front of the rotation.
    ///
    /// Returns false if the URL is already registered or does not parse.
    pub fn add_custom_proxy(&self, base_url: &str) -> bool {
        let base_url = base_url.trim();
        if url::Url::parse(base_url).is_err() {
            warn!("Ignoring custom proxy with invalid URL: {}", base_url);
            return false;
        }

        let mut state = self.lock();
        if state.position(base_url).is_some() {
            return false;
        }

        state.entries.insert(0, ProxyEntry::new(base_url));
        state.cursor = 0;
        info!("Added custom proxy {}", base_url);
        true
    }

    /// Snapshot of every proxy, in rotation order.
    pub fn status(&self) -> Vec<ProxyStatus> {
        let now = self.clock.now();
        let state = self.lock();
        state
            .entries
            .iter()
            .map(|entry| {
                let reset_at = state.excluded.get(&entry.base_url).copied();
                ProxyStatus {
                    base_url: entry.base_url.clone(),
                    style: entry.style,
                    rate_limited: reset_at.is_some_and(|r| now < r),
                    reset_at,
                }
            })
            .collect()
    }

    /// Clear every exclusion and the rotation cursor.
    pub fn reset_all(&self) {
        let mut state = self.lock();
        state.excluded.clear();
        state.cursor = 0;
        info!("Proxy registry reset");
    }
}

impl Default for ProxyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProxyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ProxyRegistry")
            .field("entries", &state.entries)
            .field("excluded", &state.excluded)
            .field("cursor", &state.cursor)
            .finish()
    }
}
