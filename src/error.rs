//! Error types for orgscan.

use reqwest::StatusCode;
use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the request client and the Salesforce consumer.
#[derive(Debug, Error)]
pub enum Error {
    /// Target or instance URL did not parse, or is not acceptable.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Access token or instance URL rejected before any request was made.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// HTTP 401. The token is not valid for this org.
    #[error("Authentication failed: access token is invalid or expired")]
    Authentication,

    /// HTTP 403. The token is valid but lacks permission for this resource.
    #[error("Access denied: token lacks permission for {url}")]
    Authorization { url: String },

    /// Every proxy attempt answered 429.
    #[error("All CORS proxies are rate limited, retry after {retry_after_secs}s")]
    AllProxiesRateLimited { retry_after_secs: u64 },

    /// Last proxy attempt returned a non-2xx status.
    #[error("Request failed with HTTP {status}: {body}")]
    RequestFailed { status: StatusCode, body: String },

    /// Last proxy attempt did not complete within its deadline.
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Fallback loop ended without a terminal outcome.
    #[error("All {attempts} request attempts failed")]
    AllAttemptsFailed { attempts: u32 },

    /// Underlying network error from the last attempt.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not have the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// Neither the identity endpoint nor the organization query answered.
    #[error("Could not resolve identity: {0}")]
    IdentityUnavailable(String),

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether retrying later (or through another path) could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::AllProxiesRateLimited { .. }
                | Error::RequestFailed { .. }
                | Error::Timeout { .. }
                | Error::AllAttemptsFailed { .. }
                | Error::Network(_)
        )
    }

    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Authentication => Some(StatusCode::UNAUTHORIZED),
            Error::Authorization { .. } => Some(StatusCode::FORBIDDEN),
            Error::AllProxiesRateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            Error::RequestFailed { status, .. } => Some(*status),
            Error::Network(e) => e.status(),
            _ => None,
        }
    }

    /// Authentication, authorization and input errors are never retried.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl { .. }
                | Error::InvalidCredentials(_)
                | Error::Authentication
                | Error::Authorization { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_are_terminal() {
        assert!(Error::Authentication.is_terminal());
        assert!(Error::Authorization {
            url: "https://x.my.salesforce.com".to_string()
        }
        .is_terminal());
        assert!(!Error::Authentication.is_retryable());
    }

    #[test]
    fn test_rate_limited_is_retryable() {
        let err = Error::AllProxiesRateLimited {
            retry_after_secs: 60,
        };
        assert!(err.is_retryable());
        assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
        assert!(err.to_string().contains("60s"));
    }
}
