//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod config_cmd;
mod org;
mod proxies;
mod relay;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use orgscan::config::{load_settings, LoadOptions, Settings};
use orgscan::{Credentials, ResilientClient, SalesforceApi};

#[derive(Parser)]
#[command(name = "orgscan")]
#[command(about = "Salesforce org scanner with CORS proxy fallback")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Org instance URL, e.g. https://acme.my.salesforce.com
    #[arg(long, global = true, env = "SF_INSTANCE_URL")]
    instance_url: Option<String>,

    /// OAuth access token
    #[arg(long, global = true, env = "SF_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Extra CORS proxy base URL (repeatable, tried before the built-in ones)
    #[arg(long = "proxy", global = true)]
    proxies: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Check the access token by fetching org limits
    Validate,

    /// Show who the access token belongs to
    Whoami {
        /// Print a placeholder identity instead of failing
        #[arg(long)]
        allow_placeholder: bool,
    },

    /// Run a SOQL query
    Query {
        /// SOQL statement
        soql: String,
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },

    /// List the configured CORS proxy rotation
    Proxies {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the local CORS relay
    Relay {
        /// Bind address (port, host, or host:port)
        #[arg(default_value = "127.0.0.1:3001")]
        bind: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Validate the configuration file
    Check,
}

/// Build the Salesforce API for the org named on the command line or in config.
fn connect(
    settings: &Settings,
    instance_url: Option<&str>,
    access_token: Option<&str>,
) -> anyhow::Result<SalesforceApi> {
    let instance_url = instance_url
        .or(settings.instance_url.as_deref())
        .ok_or_else(|| {
            anyhow::anyhow!("No instance URL. Pass --instance-url or set SF_INSTANCE_URL.")
        })?;
    let access_token = access_token.ok_or_else(|| {
        anyhow::anyhow!("No access token. Pass --access-token or set SF_ACCESS_TOKEN.")
    })?;

    let credentials = Credentials::new(access_token, instance_url)?;
    let client = ResilientClient::with_config(
        credentials,
        settings.build_registry(),
        settings.client_config(),
    )?;

    Ok(SalesforceApi::with_api_version(client, &settings.api_version))
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config.clone(),
    };
    let (mut settings, config) = load_settings(options).await?;

    // Command-line proxies take priority over configured ones
    if !cli.proxies.is_empty() {
        let configured = std::mem::take(&mut settings.proxies);
        settings.add_proxies(&cli.proxies);
        settings.add_proxies(&configured);
    }

    let instance_url = cli.instance_url.as_deref();
    let access_token = cli.access_token.as_deref();

    match cli.command {
        Commands::Validate => {
            let api = connect(&settings, instance_url, access_token)?;
            org::cmd_validate(&api).await
        }
        Commands::Whoami { allow_placeholder } => {
            let api = connect(&settings, instance_url, access_token)?;
            org::cmd_whoami(&api, allow_placeholder).await
        }
        Commands::Query { soql, json } => {
            let api = connect(&settings, instance_url, access_token)?;
            org::cmd_query(&api, &soql, json).await
        }
        Commands::Proxies { json } => proxies::cmd_proxies(&settings, json),
        Commands::Relay { bind } => relay::cmd_relay(&settings, &bind).await,
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_cmd::cmd_config_show(&settings, &config),
            ConfigCommands::Check => config_cmd::cmd_config_check(&settings, &config),
        },
    }
}
