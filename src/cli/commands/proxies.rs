//! Proxy rotation command.

use console::style;

use orgscan::config::Settings;
use orgscan::ProxyStatus;

/// Print the configured proxy rotation in priority order.
///
/// Exclusions live only inside a running client, so this shows order and
/// URL convention, not rate-limit state.
pub fn cmd_proxies(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let status = settings.build_registry().status();

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    if status.is_empty() {
        println!("{} No proxies configured", style("!").yellow());
        return Ok(());
    }

    println!("{}", style("CORS proxy rotation (priority order)").bold());
    for row in rotation_rows(&status) {
        println!("  {}", row);
    }

    Ok(())
}

fn rotation_rows(status: &[ProxyStatus]) -> Vec<String> {
    status
        .iter()
        .enumerate()
        .map(|(idx, proxy)| {
            format!(
                "{:>2}. {:<45} {}",
                idx + 1,
                proxy.base_url,
                format!("{:?}", proxy.style).to_lowercase()
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_follow_rotation_order() {
        let mut settings = Settings::default();
        settings.add_proxies(["https://relay.acme.internal/?url="]);

        let rows = rotation_rows(&settings.build_registry().status());
        assert!(rows[0].starts_with(" 1. https://relay.acme.internal/?url="));
        assert!(rows[0].ends_with("encoded"));
        assert!(rows
            .iter()
            .any(|row| row.contains("cors-anywhere.herokuapp.com") && row.ends_with("raw")));
    }
}
