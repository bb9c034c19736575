//! Standalone CORS relay.
//!
//! Forwards browser requests to Salesforce (or to the URL given in the
//! `url` query parameter) and answers with permissive CORS headers, so a
//! web dashboard can reach org endpoints without a public proxy.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::Ipv6Addr;
use std::time::Duration;

use reqwest::Client;

use crate::config::Settings;
use crate::http_client::USER_AGENT;

/// Default relay port.
pub const DEFAULT_RELAY_PORT: u16 = 3001;

/// Largest request body the relay will buffer.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared state for the relay.
#[derive(Clone)]
pub struct RelayState {
    pub client: Client,
    /// Forward target when no `url` parameter is present.
    pub upstream: String,
}

impl RelayState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_deref().unwrap_or(USER_AGENT))
            .timeout(Duration::from_secs(settings.request_timeout))
            .build()?;

        Ok(Self::with_client(client, &settings.relay_upstream))
    }

    pub fn with_client(client: Client, upstream: &str) -> Self {
        Self {
            client,
            upstream: upstream.trim_end_matches('/').to_string(),
        }
    }
}

/// Start the relay.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = RelayState::new(settings)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!(
        "Starting CORS relay at http://{} (upstream {})",
        listener.local_addr()?,
        settings.relay_upstream
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Split a relay bind address into host and port.
///
/// Accepts `PORT` (loopback), `HOST`, `HOST:PORT`, a bare IPv6 address, or
/// `[IPV6]:PORT`. The returned IPv6 host has no brackets.
pub fn parse_bind_address(bind: &str) -> (String, u16) {
    if let Ok(port) = bind.parse::<u16>() {
        return ("127.0.0.1".to_string(), port);
    }

    if let Some(rest) = bind.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            let port = tail
                .strip_prefix(':')
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(DEFAULT_RELAY_PORT);
            return (host.to_string(), port);
        }
    }

    if bind.parse::<Ipv6Addr>().is_ok() {
        return (bind.to_string(), DEFAULT_RELAY_PORT);
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return (host.to_string(), port);
        }
    }

    (bind.to_string(), DEFAULT_RELAY_PORT)
}
