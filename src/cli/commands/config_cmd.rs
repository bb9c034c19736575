//! Configuration management commands.

use console::style;

use orgscan::config::{Config, Settings};
use orgscan::Credentials;

/// Print the config file in use and the resolved settings.
pub fn cmd_config_show(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    match &config.source_path {
        Some(path) => println!("{} Config file: {}", style("→").cyan(), path.display()),
        None => println!("{} No config file found, using defaults", style("→").cyan()),
    }

    println!();
    println!("{}", style("Settings").bold());
    println!(
        "  instance_url:       {}",
        settings.instance_url.as_deref().unwrap_or("-")
    );
    println!("  request_timeout:    {}s", settings.request_timeout);
    println!("  max_proxy_attempts: {}", settings.max_proxy_attempts);
    println!("  backoff_ms:         {}", settings.backoff_ms);
    println!(
        "  user_agent:         {}",
        settings.user_agent.as_deref().unwrap_or("(default)")
    );
    println!("  api_version:        {}", settings.api_version);
    println!("  relay_upstream:     {}", settings.relay_upstream);
    if settings.proxies.is_empty() {
        println!("  proxies:            (built-in only)");
    } else {
        println!("  proxies:");
        for proxy in &settings.proxies {
            println!("    - {}", proxy);
        }
    }

    println!();
    println!("{}", style("Scanner").bold());
    println!("{}", serde_json::to_string_pretty(&settings.scanner)?);

    Ok(())
}

/// Validate the effective configuration.
pub fn cmd_config_check(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    let source = config
        .source_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    println!("{} Checking {}", style("→").cyan(), source);

    let mut problems = Vec::new();

    if let Err(e) = settings.scanner.validate() {
        problems.push(e.to_string());
    }
    if settings.request_timeout == 0 {
        problems.push("request_timeout must be at least 1 second".to_string());
    }
    if let Some(instance_url) = &settings.instance_url {
        // Any token works; only the URL is being checked.
        if let Err(e) = Credentials::new("check", instance_url) {
            problems.push(e.to_string());
        }
    }
    for proxy in &settings.proxies {
        if url::Url::parse(proxy).is_err() {
            problems.push(format!("proxy '{}' is not a valid URL", proxy));
        }
    }

    if problems.is_empty() {
        println!("  {} Configuration is valid", style("✓").green());
        return Ok(());
    }

    for problem in &problems {
        eprintln!("  {} {}", style("✗").red(), problem);
    }
    anyhow::bail!("{} configuration problem(s)", problems.len())
}
