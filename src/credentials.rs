//! Salesforce access credentials.

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

/// Bearer token plus the org it belongs to.
///
/// Validated on construction and immutable afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_token: String,
    instance_url: String,
}

impl Credentials {
    /// Validate and normalize a token and instance URL.
    ///
    /// The instance URL must be an absolute `https` URL with a host.
    /// Trailing slashes are stripped.
    pub fn new(access_token: &str, instance_url: &str) -> Result<Self> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(Error::InvalidCredentials(
                "access token is empty".to_string(),
            ));
        }

        let instance_url = normalize_instance_url(instance_url)?;
        Ok(Self {
            access_token: access_token.to_string(),
            instance_url,
        })
    }

    /// Skip the https check so tests can point at a local mock server.
    #[cfg(test)]
    pub(crate) fn insecure_for_tests(access_token: &str, instance_url: &str) -> Self {
        Self {
            access_token: access_token.to_string(),
            instance_url: instance_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Normalized instance origin, without trailing slash.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Join a path onto the instance URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.instance_url, path.trim_start_matches('/'))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("instance_url", &self.instance_url)
            .finish()
    }
}

fn normalize_instance_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let invalid = |reason: &str| Error::InvalidUrl {
        url: trimmed.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("instance URL is empty"));
    }

    let parsed = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
    if parsed.scheme() != "https" {
        return Err(invalid("instance URL must use https"));
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(invalid("instance URL has no hostname")),
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}
