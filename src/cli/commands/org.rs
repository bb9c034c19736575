//! Org commands: token validation, identity, and SOQL queries.

use console::style;

use orgscan::{IdentitySource, SalesforceApi};

/// Limits worth showing after a successful validation.
const HEADLINE_LIMITS: &[&str] = &[
    "DailyApiRequests",
    "DailyBulkApiBatches",
    "DataStorageMB",
    "FileStorageMB",
];

/// Validate the access token.
pub async fn cmd_validate(api: &SalesforceApi) -> anyhow::Result<()> {
    let instance = api.client().credentials().instance_url();
    println!("{} Validating token for {}", style("→").cyan(), instance);

    let limits = api.validate_token().await?;

    println!("  {} Token is valid", style("✓").green());
    for name in HEADLINE_LIMITS {
        if let Some(usage) = limits.get(name) {
            println!(
                "  {:<22} {:>10} / {:<10} ({} used)",
                style(name).bold(),
                usage.remaining,
                usage.max,
                usage.used()
            );
        }
    }

    Ok(())
}

/// Show the token owner.
pub async fn cmd_whoami(api: &SalesforceApi, allow_placeholder: bool) -> anyhow::Result<()> {
    let identity = if allow_placeholder {
        api.user_info_or_placeholder().await
    } else {
        api.user_info().await?
    };

    let source = match identity.source {
        IdentitySource::UserInfo => style("userinfo").green(),
        IdentitySource::Organization => style("organization query").yellow(),
        IdentitySource::Placeholder => style("placeholder").red(),
    };

    println!("{}", style("Identity").bold());
    print_field("User", identity.display_name.as_deref());
    print_field("Username", identity.username.as_deref());
    print_field("Email", identity.email.as_deref());
    print_field("User ID", identity.user_id.as_deref());
    print_field("Org", identity.organization_name.as_deref());
    print_field("Org ID", identity.organization_id.as_deref());
    println!("  {:<10} {}", "Source", source);

    if identity.source == IdentitySource::Placeholder {
        eprintln!(
            "{} Identity could not be retrieved; values above are placeholders",
            style("!").yellow()
        );
    }

    Ok(())
}

fn print_field(label: &str, value: Option<&str>) {
    if let Some(value) = value {
        println!("  {:<10} {}", label, value);
    }
}

/// Run a SOQL query and print the first page.
pub async fn cmd_query(api: &SalesforceApi, soql: &str, json: bool) -> anyhow::Result<()> {
    let result = api.query::<serde_json::Value>(soql).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "{} {} record(s){}",
        style("→").cyan(),
        result.total_size,
        if result.done {
            String::new()
        } else {
            format!(", showing first {}", result.records.len())
        }
    );

    for record in &result.records {
        let Some(fields) = record.as_object() else {
            println!("  {}", record);
            continue;
        };
        let line = fields
            .iter()
            .filter(|(key, _)| key.as_str() != "attributes")
            .map(|(key, value)| format!("{}={}", style(key).dim(), display_value(value)))
            .collect::<Vec<_>>()
            .join("  ");
        println!("  {}", line);
    }

    Ok(())
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
