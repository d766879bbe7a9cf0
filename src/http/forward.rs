//! Forward mode: relay everything under the path prefix to the upstream.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{FromRequestParts, State, WebSocketUpgrade},
    http::{header::HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::config::ForwardConfig;
use crate::error::{ForwardError, ServerError};
use crate::http::request::{
    has_body, is_websocket_upgrade, origin_header, path_and_query, prepare_headers, strip_prefix,
    upstream_target, websocket_target,
};
use crate::http::response::relay_response;
use crate::http::websocket;
use crate::observability::metrics;
use crate::security::HeaderPolicy;

/// Everything a forward handler needs, built once at startup.
#[derive(Clone)]
pub struct ForwardState {
    client: reqwest::Client,
    upstream: Arc<Url>,
    origin: HeaderValue,
    path_prefix: Arc<str>,
    outbound: Arc<HeaderPolicy>,
    inbound: Arc<HeaderPolicy>,
}

impl ForwardState {
    pub fn new(config: &ForwardConfig) -> Result<Self, ServerError> {
        let upstream = Url::parse(&config.upstream)
            .map_err(|_| ServerError::Upstream(config.upstream.clone()))?;
        let origin =
            origin_header(&upstream).ok_or_else(|| ServerError::Upstream(config.upstream.clone()))?;

        // Redirects go back to the client untouched; system proxy settings are ignored.
        let client = reqwest::Client::builder()
            .no_proxy()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            upstream: Arc::new(upstream),
            origin,
            path_prefix: Arc::from(config.path_prefix.as_str()),
            outbound: Arc::new(HeaderPolicy::outbound(config.hardened)),
            inbound: Arc::new(HeaderPolicy::inbound()),
        })
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }
}

/// Relay one request (or WebSocket session) to the upstream.
pub async fn forward_handler(State(state): State<ForwardState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let path = request.uri().path().to_owned();

    let Some(rest) = strip_prefix(&path, &state.path_prefix) else {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };

    let target = match upstream_target(&state.upstream, rest, request.uri().query()) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Cannot build upstream target");
            return e.into_response();
        }
    };

    tracing::debug!(
        method = %request.method(),
        path = %path_and_query(request.uri()),
        url = %target,
        "Forwarding request"
    );

    let (mut parts, body) = request.into_parts();
    let headers = prepare_headers(&parts.headers, &state.origin, &state.outbound);

    if is_websocket_upgrade(&parts.headers) {
        let ws_target = match websocket_target(&target) {
            Ok(t) => t,
            Err(e) => return e.into_response(),
        };
        return match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
            Ok(ws) => {
                let response = websocket::relay(ws, ws_target, headers, &state.inbound).await;
                metrics::record_request("forward", response.status().as_u16(), start);
                response
            }
            Err(rejection) => rejection.into_response(),
        };
    }

    let mut outbound = state
        .client
        .request(parts.method.clone(), target.clone())
        .headers(headers);
    if has_body(&body) {
        outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    match outbound.send().await {
        Ok(upstream) => {
            let status = upstream.status();
            tracing::debug!(url = %target, status = %status, "Upstream responded");
            metrics::record_request("forward", status.as_u16(), start);
            relay_response(upstream, &state.inbound)
        }
        Err(e) => {
            let error = ForwardError::from(e);
            tracing::error!(url = %target, error = %error, "Upstream error");
            metrics::record_upstream_error();
            metrics::record_request("forward", error.status().as_u16(), start);
            error.into_response()
        }
    }
}
