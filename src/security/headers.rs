//! Header manipulation for relayed traffic.
//!
//! Both legs of a forwarded exchange go through a [`HeaderPolicy`]: an
//! ordered list of [`HeaderRule`]s applied top to bottom. The outbound
//! policy makes the relay look like an ordinary browser to the upstream; the
//! inbound policy lets the relayed page be embedded.

use axum::http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    StatusCode,
};

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
pub const ACCEPT_ENCODING: &str = "gzip, deflate, br";
pub const CACHE_CONTROL: &str = "no-cache";

/// Internal correlation header; never leaves the relay.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const X_FRAME_OPTIONS: HeaderName = HeaderName::from_static("x-frame-options");
const CSP_REPORT_ONLY: HeaderName =
    HeaderName::from_static("content-security-policy-report-only");
const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");
const PROXY_CONNECTION: HeaderName = HeaderName::from_static("proxy-connection");

/// One step of a header policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderRule {
    /// Delete every value of the header.
    Remove(HeaderName),
    /// Delete every header whose lowercase name starts with the prefix.
    RemovePrefix(&'static str),
    /// Overwrite (or insert) the header.
    Set(HeaderName, HeaderValue),
    /// Overwrite the header only when the response status is listed.
    SetForStatus {
        name: HeaderName,
        value: HeaderValue,
        statuses: Vec<StatusCode>,
    },
}

impl HeaderRule {
    fn apply(&self, headers: &mut HeaderMap, status: Option<StatusCode>) -> bool {
        match self {
            HeaderRule::Remove(name) => headers.remove(name).is_some(),
            HeaderRule::RemovePrefix(prefix) => {
                let doomed: Vec<HeaderName> = headers
                    .keys()
                    .filter(|name| name.as_str().starts_with(*prefix))
                    .cloned()
                    .collect();
                for name in &doomed {
                    headers.remove(name);
                }
                !doomed.is_empty()
            }
            HeaderRule::Set(name, value) => {
                headers.insert(name.clone(), value.clone());
                true
            }
            HeaderRule::SetForStatus {
                name,
                value,
                statuses,
            } => match status {
                Some(status) if statuses.contains(&status) => {
                    headers.insert(name.clone(), value.clone());
                    true
                }
                _ => false,
            },
        }
    }
}

/// Ordered, immutable list of header rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderPolicy {
    rules: Vec<HeaderRule>,
}

impl HeaderPolicy {
    pub fn new(rules: Vec<HeaderRule>) -> Self {
        Self { rules }
    }

    /// Policy for requests leaving the relay towards the upstream.
    ///
    /// `hardened` additionally strips `X-Forwarded-*` and `Forwarded`.
    pub fn outbound(hardened: bool) -> Self {
        let mut rules = Vec::new();
        if hardened {
            rules.push(HeaderRule::RemovePrefix("x-forwarded-"));
            rules.push(HeaderRule::Remove(header::FORWARDED));
        }
        rules.push(HeaderRule::Remove(X_REQUEST_ID));
        rules.extend([
            HeaderRule::Set(header::USER_AGENT, HeaderValue::from_static(USER_AGENT)),
            HeaderRule::Set(header::ACCEPT, HeaderValue::from_static(ACCEPT)),
            HeaderRule::Set(header::ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE)),
            HeaderRule::Set(header::ACCEPT_ENCODING, HeaderValue::from_static(ACCEPT_ENCODING)),
            HeaderRule::Set(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL)),
            HeaderRule::Set(header::PRAGMA, HeaderValue::from_static(CACHE_CONTROL)),
        ]);
        Self { rules }
    }

    /// Policy for upstream responses on their way back to the client.
    pub fn inbound() -> Self {
        Self {
            rules: vec![
                HeaderRule::Remove(X_FRAME_OPTIONS),
                HeaderRule::Remove(header::CONTENT_SECURITY_POLICY),
                HeaderRule::Remove(CSP_REPORT_ONLY),
                // Content-Type only; the body is left untouched.
                HeaderRule::SetForStatus {
                    name: header::CONTENT_TYPE,
                    value: HeaderValue::from_static("text/html"),
                    statuses: vec![StatusCode::FORBIDDEN, StatusCode::SERVICE_UNAVAILABLE],
                },
            ],
        }
    }

    /// Apply every rule in order. Returns how many rules changed the map.
    pub fn apply(&self, headers: &mut HeaderMap, status: Option<StatusCode>) -> usize {
        let mut changed = 0;
        for rule in &self.rules {
            if rule.apply(headers, status) {
                changed += 1;
                tracing::trace!(rule = ?rule, "Header rule applied");
            }
        }
        changed
    }
}

/// Remove connection-scoped headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }

    for name in [
        header::CONNECTION,
        KEEP_ALIVE,
        PROXY_CONNECTION,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
        header::TE,
        header::TRAILER,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
    ] {
        headers.remove(name);
    }
}
