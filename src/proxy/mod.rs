//! CORS proxy registry.
//!
//! Keeps the ordered list of relays the request client may fall back to and
//! remembers which of them are rate limited or failing. Exclusions expire on
//! their own; nothing is ever removed from the rotation.

mod clock;
mod registry;
mod style;

pub use clock::{Clock, ManualClock, SystemClock};
pub use registry::{
    ProxyEntry, ProxyRegistry, ProxyStatus, DEFAULT_RATE_LIMIT_SECS, FAILURE_EXCLUSION_SECS,
};
pub use style::{KnownProxy, ProxyStyle, KNOWN_PROXIES};

/// Parse a `Retry-After` header value in seconds.
///
/// HTTP-date values and garbage return `None`; callers fall back to
/// [`DEFAULT_RATE_LIMIT_SECS`].
pub fn parse_retry_after(header_value: Option<&str>) -> Option<u64> {
    header_value?.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(Some("60")), Some(60));
        assert_eq!(parse_retry_after(Some(" 120 ")), Some(120));
        assert_eq!(parse_retry_after(Some("Wed, 21 Oct 2015 07:28:00 GMT")), None);
        assert_eq!(parse_retry_after(Some("-5")), None);
        assert_eq!(parse_retry_after(None), None);
    }
}
