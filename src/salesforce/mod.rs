//! Read-only Salesforce calls built on the resilient client.

mod types;

pub use types::{IdentitySource, LimitUsage, OrgLimits, QueryResult, UserIdentity};

use serde::de::DeserializeOwned;
use tracing::{info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::http_client::ResilientClient;
use types::{OrganizationRecord, UserInfoBody};

/// REST API version used for data endpoints.
pub const DEFAULT_API_VERSION: &str = "v58.0";

const USERINFO_PATH: &str = "services/oauth2/userinfo";
const ORGANIZATION_SOQL: &str = "SELECT Id, Name FROM Organization LIMIT 1";

/// Salesforce REST consumer for one org.
#[derive(Clone)]
pub struct SalesforceApi {
    client: ResilientClient,
    api_version: String,
}

impl SalesforceApi {
    pub fn new(client: ResilientClient) -> Self {
        Self::with_api_version(client, DEFAULT_API_VERSION)
    }

    pub fn with_api_version(client: ResilientClient, api_version: &str) -> Self {
        let api_version = if api_version.starts_with('v') {
            api_version.to_string()
        } else {
            format!("v{}", api_version)
        };
        Self {
            client,
            api_version,
        }
    }

    pub fn client(&self) -> &ResilientClient {
        &self.client
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn data_url(&self, resource: &str) -> String {
        self.client.credentials().endpoint(&format!(
            "services/data/{}/{}",
            self.api_version,
            resource.trim_start_matches('/')
        ))
    }

    /// Cheap token check: fetch the org limits.
    pub async fn validate_token(&self) -> Result<OrgLimits> {
        let limits: OrgLimits = self.client.get_json(&self.data_url("limits")).await?;
        if let Some(api) = limits.daily_api_requests() {
            info!(
                "Token valid, {} of {} daily API requests remaining",
                api.remaining, api.max
            );
        }
        Ok(limits)
    }

    /// Run a SOQL query and return the first page.
    pub async fn query<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        let mut url = Url::parse(&self.data_url("query")).map_err(|e| Error::InvalidUrl {
            url: self.data_url("query"),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("q", soql);
        self.client.get_json(url.as_str()).await
    }

    /// Identify the token owner.
    ///
    /// Falls back to the Organization query when userinfo is unavailable
    /// (typically 403 for tokens without the `openid` scope). Fails when
    /// both fail; authentication errors are never masked.
    pub async fn user_info(&self) -> Result<UserIdentity> {
        let userinfo_err = match self
            .client
            .get_json::<UserInfoBody>(&self.client.credentials().endpoint(USERINFO_PATH))
            .await
        {
            Ok(body) => return Ok(UserIdentity::from_user_info(body)),
            Err(e) if short_circuits_identity(&e) => return Err(e),
            Err(e) => e,
        };

        warn!(
            "userinfo unavailable ({}), falling back to organization query",
            userinfo_err
        );

        match self.query::<OrganizationRecord>(ORGANIZATION_SOQL).await {
            Ok(result) => match result.records.into_iter().next() {
                Some(org) => Ok(UserIdentity::from_organization(org)),
                None => Err(Error::IdentityUnavailable(format!(
                    "userinfo failed ({}) and the organization query returned no rows",
                    userinfo_err
                ))),
            },
            Err(e) if short_circuits_identity(&e) => Err(e),
            Err(e) => Err(Error::IdentityUnavailable(format!(
                "userinfo failed ({}); organization query failed ({})",
                userinfo_err, e
            ))),
        }
    }

    /// Like [`Self::user_info`], but never fails.
    ///
    /// The placeholder is tagged [`IdentitySource::Placeholder`]; callers
    /// must not present it as the real identity.
    pub async fn user_info_or_placeholder(&self) -> UserIdentity {
        match self.user_info().await {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Using placeholder identity: {}", e);
                UserIdentity::placeholder()
            }
        }
    }
}

fn short_circuits_identity(err: &Error) -> bool {
    matches!(
        err,
        Error::Authentication | Error::InvalidUrl { .. } | Error::InvalidCredentials(_)
    )
}
