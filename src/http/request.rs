//! Outbound request preparation.
//!
//! # Responsibilities
//! - Strip the relay's path prefix
//! - Build the upstream URL (path and query preserved)
//! - Rewrite origin-identifying headers to the upstream (changeOrigin)
//! - Apply the outbound header policy

use axum::{
    body::HttpBody,
    http::{
        header::{self, HeaderMap, HeaderValue},
        Uri,
    },
};
use url::Url;

use crate::error::ForwardError;
use crate::security::{strip_hop_by_hop, HeaderPolicy};

/// Remainder of `path` below `prefix`, always starting with '/'.
///
/// `/proxy` and `/proxy/` both map to `/`; `/proxyfoo` does not match.
pub fn strip_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Upstream URL for a request whose path below the prefix is `rest`.
///
/// The result goes through WHATWG URL parsing: dot segments are resolved and
/// characters outside the URL code points are percent-encoded.
pub fn upstream_target(upstream: &Url, rest: &str, query: Option<&str>) -> Result<Url, ForwardError> {
    let base = upstream.as_str().trim_end_matches('/');
    let mut raw = String::with_capacity(base.len() + rest.len() + 1);
    raw.push_str(base);
    raw.push_str(rest);
    if let Some(query) = query {
        raw.push('?');
        raw.push_str(query);
    }

    Url::parse(&raw).map_err(|e| ForwardError::InvalidTarget(format!("{}: {}", raw, e)))
}

/// Same target, `ws`/`wss` scheme.
pub fn websocket_target(target: &Url) -> Result<Url, ForwardError> {
    let scheme = match target.scheme() {
        "https" => "wss",
        _ => "ws",
    };
    let mut ws = target.clone();
    ws.set_scheme(scheme)
        .map_err(|_| ForwardError::InvalidTarget(format!("cannot use {} over websocket", target)))?;
    Ok(ws)
}

/// `Origin` value identifying the upstream itself.
pub fn origin_header(upstream: &Url) -> Option<HeaderValue> {
    HeaderValue::from_str(&upstream.origin().ascii_serialization()).ok()
}

/// Whether the client asked to switch to the WebSocket protocol.
pub fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    let upgrade = headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"));

    let connection = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    upgrade && connection
}

/// Whether the inbound body may yield any data.
///
/// Decided from the body itself: HTTP/2 requests can carry data with
/// neither `Content-Length` nor `Transfer-Encoding`.
pub fn has_body<B: HttpBody>(body: &B) -> bool {
    !body.is_end_stream() && body.size_hint().exact() != Some(0)
}

/// Headers for the upstream leg.
///
/// `Host` is dropped so the client sets it from the upstream URL; `Origin`
/// is pointed at the upstream when the client sent one.
pub fn prepare_headers(inbound: &HeaderMap, origin: &HeaderValue, policy: &HeaderPolicy) -> HeaderMap {
    let mut headers = inbound.clone();
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    if headers.contains_key(header::ORIGIN) {
        headers.insert(header::ORIGIN, origin.clone());
    }
    policy.apply(&mut headers, None);
    headers
}

/// Path and query of `uri`, for logging.
pub fn path_and_query(uri: &Uri) -> &str {
    uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
}
