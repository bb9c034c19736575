//! orgscan - Salesforce org scanner client.

mod cli;

use std::process::ExitCode;

use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging() {
    let default_filter = if cli::is_verbose() {
        "orgscan=info"
    } else {
        "orgscan=warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env may carry SF_INSTANCE_URL / SF_ACCESS_TOKEN, so load it before parsing args
    let _ = dotenvy::dotenv();
    init_logging();

    match cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
