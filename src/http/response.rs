//! Upstream response transformation.
//!
//! Status and body stream through untouched; headers lose hop-by-hop
//! entries and go through the inbound policy.

use axum::{
    body::Body,
    response::Response,
};

use crate::security::{strip_hop_by_hop, HeaderPolicy};

/// Turn an upstream response into the client response, streaming the body.
pub fn relay_response(upstream: reqwest::Response, policy: &HeaderPolicy) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);
    policy.apply(&mut headers, Some(status));

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
