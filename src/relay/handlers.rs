//! Relay handlers.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{self, HeaderMap, HeaderName};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use url::Url;

use super::{RelayState, MAX_BODY_BYTES};

/// Headers that describe a single connection, not the message.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Forward any request to its target and copy the answer back.
pub async fn forward(State(state): State<RelayState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let target = match resolve_target(&state.upstream, &parts.uri) {
        Ok(target) => target,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, msg),
    };

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            return error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("Failed to read request body: {}", e),
            )
        }
    };

    tracing::info!("{} {} -> {}", parts.method, parts.uri.path(), target);

    let mut upstream = state.client.request(parts.method.clone(), target.as_str());
    for (name, value) in parts.headers.iter() {
        if forwards_request_header(name) {
            upstream = upstream.header(name.clone(), value.clone());
        }
    }
    if !body.is_empty() {
        upstream = upstream.body(body);
    }

    let response = match upstream.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Relay to {} failed: {}", target, e);
            return error_response(
                StatusCode::BAD_GATEWAY,
                format!("Upstream request failed: {}", e),
            );
        }
    };

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            return error_response(
                StatusCode::BAD_GATEWAY,
                format!("Failed to read upstream response: {}", e),
            )
        }
    };

    let mut builder = axum::http::Response::builder().status(status);
    if let Some(out) = builder.headers_mut() {
        copy_response_headers(&headers, out);
    }
    builder
        .body(Body::from(bytes))
        .unwrap_or_else(|e| error_response(StatusCode::BAD_GATEWAY, e.to_string()))
}

/// The `url` query parameter wins; otherwise upstream + original path and query.
fn resolve_target(upstream: &str, uri: &Uri) -> Result<String, String> {
    let explicit = uri.query().and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(key, _)| key == "url")
            .map(|(_, value)| value.into_owned())
    });

    match explicit {
        Some(target) => {
            let parsed = Url::parse(&target)
                .map_err(|e| format!("Invalid target URL '{}': {}", target, e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(format!("Unsupported target scheme '{}'", parsed.scheme()));
            }
            Ok(parsed.to_string())
        }
        None => {
            let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
            Ok(format!("{}{}", upstream, path_and_query))
        }
    }
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

fn forwards_request_header(name: &HeaderName) -> bool {
    !is_hop_by_hop(name)
        && *name != header::HOST
        && *name != header::ORIGIN
        && *name != header::CONTENT_LENGTH
        && *name != header::ACCEPT_ENCODING
}

fn copy_response_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from.iter() {
        if is_hop_by_hop(name)
            || *name == header::CONTENT_LENGTH
            || name.as_str().starts_with("access-control-")
        {
            continue;
        }
        to.append(name.clone(), value.clone());
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPSTREAM: &str = "https://login.salesforce.com";

    #[test]
    fn test_resolve_default_upstream() {
        let uri: Uri = "/services/oauth2/token?grant_type=password".parse().unwrap();
        assert_eq!(
            resolve_target(UPSTREAM, &uri).unwrap(),
            "https://login.salesforce.com/services/oauth2/token?grant_type=password"
        );
    }

    #[test]
    fn test_resolve_explicit_target() {
        let uri: Uri = "/proxy?url=https%3A%2F%2Facme.my.salesforce.com%2Fservices%2Fdata"
            .parse()
            .unwrap();
        assert_eq!(
            resolve_target(UPSTREAM, &uri).unwrap(),
            "https://acme.my.salesforce.com/services/data"
        );
    }

    #[test]
    fn test_resolve_rejects_bad_target() {
        let uri: Uri = "/?url=not-a-url".parse().unwrap();
        assert!(resolve_target(UPSTREAM, &uri).is_err());

        let uri: Uri = "/?url=file%3A%2F%2F%2Fetc%2Fpasswd".parse().unwrap();
        assert!(resolve_target(UPSTREAM, &uri).is_err());
    }

    #[test]
    fn test_request_header_filter() {
        assert!(forwards_request_header(&header::AUTHORIZATION));
        assert!(forwards_request_header(&header::CONTENT_TYPE));
        assert!(!forwards_request_header(&header::HOST));
        assert!(!forwards_request_header(&header::ORIGIN));
        assert!(!forwards_request_header(&header::CONNECTION));
    }
}
