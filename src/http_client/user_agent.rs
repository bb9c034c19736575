//! User agent sent on each request path.
//!
//! Direct Salesforce calls identify as orgscan. Several public CORS proxies
//! turn away non-browser clients, so proxy attempts present a browser user
//! agent instead, cycling through [`BROWSER_USER_AGENTS`] by attempt number.
//! A user agent set in config overrides both.

use std::borrow::Cow;

use super::RequestPath;

pub const USER_AGENT: &str = concat!("orgscan/", env!("CARGO_PKG_VERSION"));

pub const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// User agent for one attempt. `proxy_attempt` is 1-based.
pub fn user_agent_for<'a>(
    configured: Option<&'a str>,
    path: &RequestPath,
    proxy_attempt: u32,
) -> Cow<'a, str> {
    if let Some(custom) = configured.filter(|ua| !ua.trim().is_empty()) {
        return Cow::Borrowed(custom);
    }
    match path {
        RequestPath::Direct => Cow::Borrowed(USER_AGENT),
        RequestPath::Proxy { .. } => {
            let idx = proxy_attempt.saturating_sub(1) as usize % BROWSER_USER_AGENTS.len();
            Cow::Borrowed(BROWSER_USER_AGENTS[idx])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy() -> RequestPath {
        RequestPath::Proxy {
            base_url: "https://corsproxy.io/?".to_string(),
        }
    }

    #[test]
    fn test_direct_identifies_as_orgscan() {
        let ua = user_agent_for(None, &RequestPath::Direct, 0);
        assert!(ua.starts_with("orgscan/"));
    }

    #[test]
    fn test_proxy_attempts_cycle_browser_agents() {
        assert_eq!(user_agent_for(None, &proxy(), 1), BROWSER_USER_AGENTS[0]);
        assert_eq!(user_agent_for(None, &proxy(), 2), BROWSER_USER_AGENTS[1]);
        let wrapped = BROWSER_USER_AGENTS.len() as u32 + 1;
        assert_eq!(user_agent_for(None, &proxy(), wrapped), BROWSER_USER_AGENTS[0]);
    }

    #[test]
    fn test_configured_agent_wins_everywhere() {
        assert_eq!(
            user_agent_for(Some("ScanBot/2.0"), &RequestPath::Direct, 0),
            "ScanBot/2.0"
        );
        assert_eq!(user_agent_for(Some("ScanBot/2.0"), &proxy(), 2), "ScanBot/2.0");
        assert!(user_agent_for(Some("  "), &RequestPath::Direct, 0).starts_with("orgscan/"));
    }
}
