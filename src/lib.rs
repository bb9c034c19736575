//! orgscan - Salesforce org scanner client.
//!
//! Reaches Salesforce REST endpoints directly when possible and through a
//! rotating set of CORS proxies when not, keeping per-proxy rate-limit
//! bookkeeping shared across clients.

pub mod config;
pub mod credentials;
pub mod error;
pub mod http_client;
pub mod proxy;
pub mod relay;
pub mod salesforce;

pub use credentials::Credentials;
pub use error::{Error, Result};
pub use http_client::{ClientConfig, HttpResponse, RequestOptions, RequestPath, ResilientClient};
pub use proxy::{ProxyRegistry, ProxyStatus};
pub use salesforce::{IdentitySource, OrgLimits, SalesforceApi, UserIdentity};
