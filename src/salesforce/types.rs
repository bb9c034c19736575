//! Response types for the Salesforce endpoints orgscan reads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One entry of `/limits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitUsage {
    #[serde(rename = "Max")]
    pub max: i64,
    #[serde(rename = "Remaining")]
    pub remaining: i64,
}

impl LimitUsage {
    pub fn used(&self) -> i64 {
        self.max - self.remaining
    }
}

/// Org limits keyed by limit name (`DailyApiRequests`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgLimits {
    pub limits: BTreeMap<String, LimitUsage>,
}

impl OrgLimits {
    pub fn get(&self, name: &str) -> Option<&LimitUsage> {
        self.limits.get(name)
    }

    pub fn daily_api_requests(&self) -> Option<&LimitUsage> {
        self.get("DailyApiRequests")
    }
}

/// Body of `/services/oauth2/userinfo`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserInfoBody {
    pub user_id: Option<String>,
    pub organization_id: Option<String>,
    pub preferred_username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Result page of a SOQL query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<T = serde_json::Value> {
    pub total_size: u64,
    pub done: bool,
    #[serde(default)]
    pub next_records_url: Option<String>,
    pub records: Vec<T>,
}

/// Row of `SELECT Id, Name FROM Organization`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OrganizationRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: Option<String>,
}

/// Where an identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentitySource {
    /// `/services/oauth2/userinfo`
    UserInfo,
    /// Organization query; no user details.
    Organization,
    /// Not from Salesforce at all.
    Placeholder,
}

impl IdentitySource {
    /// Only userinfo identifies the user behind the token.
    pub fn is_authoritative(self) -> bool {
        matches!(self, IdentitySource::UserInfo)
    }
}

/// Who the token belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserIdentity {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub organization_id: Option<String>,
    pub organization_name: Option<String>,
    pub source: IdentitySource,
}

impl UserIdentity {
    pub(crate) fn from_user_info(body: UserInfoBody) -> Self {
        Self {
            user_id: body.user_id,
            username: body.preferred_username,
            display_name: body.name,
            email: body.email,
            organization_id: body.organization_id,
            organization_name: None,
            source: IdentitySource::UserInfo,
        }
    }

    pub(crate) fn from_organization(org: OrganizationRecord) -> Self {
        Self {
            user_id: None,
            username: None,
            display_name: None,
            email: None,
            organization_id: Some(org.id),
            organization_name: org.name,
            source: IdentitySource::Organization,
        }
    }

    /// Stand-in used only by `user_info_or_placeholder`.
    pub fn placeholder() -> Self {
        Self {
            user_id: None,
            username: None,
            display_name: Some("Unknown User".to_string()),
            email: None,
            organization_id: None,
            organization_name: Some("Unknown Organization".to_string()),
            source: IdentitySource::Placeholder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limits() {
        let json = r#"{
            "DailyApiRequests": {"Max": 15000, "Remaining": 14998},
            "DataStorageMB": {"Max": 5, "Remaining": 5, "Extra": true}
        }"#;
        let limits: OrgLimits = serde_json::from_str(json).unwrap();
        let api = limits.daily_api_requests().unwrap();
        assert_eq!(api.max, 15000);
        assert_eq!(api.used(), 2);
        assert_eq!(limits.limits.len(), 2);
    }

    #[test]
    fn test_parse_query_result() {
        let json = r#"{
            "totalSize": 1,
            "done": true,
            "records": [{"attributes": {"type": "Organization"}, "Id": "00D000000000001", "Name": "Acme"}]
        }"#;
        let result: QueryResult<OrganizationRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(result.total_size, 1);
        assert!(result.next_records_url.is_none());
        assert_eq!(result.records[0].name.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_placeholder_is_not_authoritative() {
        let identity = UserIdentity::placeholder();
        assert_eq!(identity.source, IdentitySource::Placeholder);
        assert!(!identity.source.is_authoritative());
        assert!(IdentitySource::UserInfo.is_authoritative());
    }
}
