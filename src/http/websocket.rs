//! WebSocket proxy handling.
//!
//! # Data Flow
//! ```text
//! Client ←──── WebSocket frames ────→ Relay ←──── WebSocket frames ────→ Upstream
//! ```
//!
//! The upstream handshake runs first, carrying the same policy-rewritten
//! headers as a plain forwarded request. Only once the upstream has switched
//! protocols is the client upgraded, with the subprotocol the upstream chose.
//! A refused upstream handshake reaches the client as an ordinary response.
//! Frames are then forwarded one by one until either side closes.

use std::time::Duration;

use axum::{
    body::Body,
    extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    http::header::{self, HeaderMap, HeaderName},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, client::IntoClientRequest, protocol::frame::coding::CloseCode},
    MaybeTlsStream, WebSocketStream,
};
use url::Url;

use crate::error::ForwardError;
use crate::security::{strip_hop_by_hop, HeaderPolicy};

type UpstreamSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Handshake response as returned by the upstream client.
type Handshake = axum::http::Response<Option<Vec<u8>>>;

/// Handshake headers the upstream client generates itself.
const HANDSHAKE_HEADERS: [HeaderName; 4] = [
    header::SEC_WEBSOCKET_KEY,
    header::SEC_WEBSOCKET_VERSION,
    header::SEC_WEBSOCKET_EXTENSIONS,
    header::SEC_WEBSOCKET_ACCEPT,
];

/// How long the second direction may keep running once the first has ended,
/// so the peer's Close reply still gets through.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Connect to `target`, then complete the client upgrade and bridge the two.
pub async fn relay(
    ws: WebSocketUpgrade,
    target: Url,
    headers: HeaderMap,
    inbound: &HeaderPolicy,
) -> Response {
    let (upstream, handshake) = match connect_upstream(&target, &headers).await {
        Ok(connected) => connected,
        Err(tungstenite::Error::Http(refusal)) => {
            tracing::warn!(
                url = %target,
                status = %refusal.status(),
                "Upstream refused WebSocket upgrade"
            );
            return refused(refusal, inbound);
        }
        Err(e) => {
            tracing::warn!(url = %target, error = %e, "Upstream WebSocket handshake failed");
            return ForwardError::Handshake(Box::new(e)).into_response();
        }
    };

    let selected = handshake
        .headers()
        .get(header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let ws = match selected {
        Some(protocol) => ws.protocols([protocol]),
        None => ws,
    };

    ws.on_upgrade(move |client| async move {
        tracing::debug!(url = %target, "WebSocket relay established");
        pump(client, upstream).await;
        tracing::debug!(url = %target, "WebSocket relay closed");
    })
}

async fn connect_upstream(
    target: &Url,
    headers: &HeaderMap,
) -> Result<(UpstreamSocket, Handshake), tungstenite::Error> {
    let mut request = target.as_str().into_client_request()?;
    for (name, value) in headers {
        if !HANDSHAKE_HEADERS.contains(name) {
            request.headers_mut().append(name.clone(), value.clone());
        }
    }

    connect_async(request).await
}

/// The upstream's non-101 answer, passed on like any relayed response.
fn refused(refusal: Handshake, policy: &HeaderPolicy) -> Response {
    let (parts, body) = refusal.into_parts();
    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    headers.remove(header::CONTENT_LENGTH);
    policy.apply(&mut headers, Some(parts.status));

    let mut response = Response::new(Body::from(body.unwrap_or_default()));
    *response.status_mut() = parts.status;
    *response.headers_mut() = headers;
    response
}

/// Forward frames both ways. Once one direction ends, the other gets
/// [`CLOSE_GRACE`] to deliver the closing handshake.
async fn pump(client: WebSocket, upstream: UpstreamSocket) {
    let (mut client_tx, mut client_rx) = client.split();
    let (mut upstream_tx, mut upstream_rx) = upstream.split();

    let client_to_upstream = async {
        while let Some(Ok(message)) = client_rx.next().await {
            let closing = matches!(message, Message::Close(_));
            if upstream_tx.send(to_upstream(message)).await.is_err() || closing {
                break;
            }
        }
        let _ = upstream_tx.close().await;
    };

    let upstream_to_client = async {
        while let Some(Ok(message)) = upstream_rx.next().await {
            let Some(message) = to_client(message) else {
                continue;
            };
            let closing = matches!(message, Message::Close(_));
            if client_tx.send(message).await.is_err() || closing {
                break;
            }
        }
        let _ = client_tx.close().await;
    };

    tokio::pin!(client_to_upstream, upstream_to_client);

    let client_finished = tokio::select! {
        _ = &mut client_to_upstream => true,
        _ = &mut upstream_to_client => false,
    };

    let drained = if client_finished {
        tokio::time::timeout(CLOSE_GRACE, &mut upstream_to_client).await
    } else {
        tokio::time::timeout(CLOSE_GRACE, &mut client_to_upstream).await
    };
    if drained.is_err() {
        tracing::debug!("Peer did not finish the close handshake in time");
    }
}

fn to_upstream(message: Message) -> tungstenite::Message {
    match message {
        Message::Text(text) => tungstenite::Message::Text(text.as_str().into()),
        Message::Binary(data) => tungstenite::Message::Binary(data),
        Message::Ping(data) => tungstenite::Message::Ping(data),
        Message::Pong(data) => tungstenite::Message::Pong(data),
        Message::Close(frame) => tungstenite::Message::Close(frame.map(|f| {
            tungstenite::protocol::CloseFrame {
                code: CloseCode::from(f.code),
                reason: f.reason.as_str().into(),
            }
        })),
    }
}

fn to_client(message: tungstenite::Message) -> Option<Message> {
    Some(match message {
        tungstenite::Message::Text(text) => Message::Text(text.as_str().into()),
        tungstenite::Message::Binary(data) => Message::Binary(data),
        tungstenite::Message::Ping(data) => Message::Ping(data),
        tungstenite::Message::Pong(data) => Message::Pong(data),
        tungstenite::Message::Close(frame) => Message::Close(frame.map(|f| CloseFrame {
            code: u16::from(f.code),
            reason: f.reason.as_str().into(),
        })),
        tungstenite::Message::Frame(_) => return None,
    })
}
