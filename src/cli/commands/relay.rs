//! CORS relay command.

use console::style;

use orgscan::config::Settings;
use orgscan::relay::{self, parse_bind_address};

/// Start the relay.
pub async fn cmd_relay(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind);
    let shown_host = if host.contains(':') {
        format!("[{}]", host)
    } else {
        host.clone()
    };

    println!(
        "{} Starting CORS relay at http://{}:{}",
        style("→").cyan(),
        shown_host,
        port
    );
    println!("  Forwarding to {} by default", settings.relay_upstream);
    println!("  Press Ctrl+C to stop");

    relay::serve(settings, &host, port).await
}
