//! Proxy URL conventions.
//!
//! Each public CORS proxy expects the target URL appended to its base in a
//! particular form. Known proxies are listed in [`KNOWN_PROXIES`]; anything
//! else is assumed to want the target percent-encoded.

use serde::Serialize;

/// How the target URL is appended to a proxy base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyStyle {
    /// `base + target` with the target left as-is.
    Raw,
    /// `base + urlencode(target)`.
    Encoded,
}

impl ProxyStyle {
    /// Build the proxied URL for a target.
    pub fn format(self, base_url: &str, target_url: &str) -> String {
        match self {
            ProxyStyle::Raw => format!("{}{}", base_url, target_url),
            ProxyStyle::Encoded => format!("{}{}", base_url, urlencoding::encode(target_url)),
        }
    }

    /// Look up the convention for a base URL by its host.
    pub fn for_base(base_url: &str) -> Self {
        let host = url::Url::parse(base_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()));

        host.and_then(|host| {
            KNOWN_PROXIES
                .iter()
                .find(|known| known.host == host)
                .map(|known| known.style)
        })
        .unwrap_or(ProxyStyle::Encoded)
    }
}

/// A public CORS proxy with a known convention.
#[derive(Debug, Clone, Copy)]
pub struct KnownProxy {
    pub host: &'static str,
    pub base_url: &'static str,
    pub style: ProxyStyle,
}

/// Default proxies, in rotation order.
pub const KNOWN_PROXIES: &[KnownProxy] = &[
    KnownProxy {
        host: "corsproxy.io",
        base_url: "https://corsproxy.io/?",
        style: ProxyStyle::Encoded,
    },
    KnownProxy {
        host: "api.allorigins.win",
        base_url: "https://api.allorigins.win/raw?url=",
        style: ProxyStyle::Encoded,
    },
    KnownProxy {
        host: "cors-anywhere.herokuapp.com",
        base_url: "https://cors-anywhere.herokuapp.com/",
        style: ProxyStyle::Raw,
    },
    KnownProxy {
        host: "thingproxy.freeboard.io",
        base_url: "https://thingproxy.freeboard.io/fetch/",
        style: ProxyStyle::Raw,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: &str = "https://acme.my.salesforce.com/services/oauth2/userinfo";

    #[test]
    fn test_known_styles() {
        assert_eq!(
            ProxyStyle::for_base("https://corsproxy.io/?"),
            ProxyStyle::Encoded
        );
        assert_eq!(
            ProxyStyle::for_base("https://cors-anywhere.herokuapp.com/"),
            ProxyStyle::Raw
        );
    }

    #[test]
    fn test_unknown_proxy_defaults_to_encoded() {
        assert_eq!(
            ProxyStyle::for_base("https://my-proxy.example/"),
            ProxyStyle::Encoded
        );
        assert_eq!(ProxyStyle::for_base("not a url"), ProxyStyle::Encoded);
    }

    #[test]
    fn test_format() {
        assert_eq!(
            ProxyStyle::Raw.format("https://cors-anywhere.herokuapp.com/", TARGET),
            format!("https://cors-anywhere.herokuapp.com/{}", TARGET)
        );
        assert_eq!(
            ProxyStyle::Encoded.format("https://corsproxy.io/?", TARGET),
            "https://corsproxy.io/?https%3A%2F%2Facme.my.salesforce.com%2Fservices%2Foauth2%2Fuserinfo"
        );
    }
}
