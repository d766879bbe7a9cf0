//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path,
    },
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;

use web_relay::{HttpServer, RelayConfig, Shutdown};

/// Subprotocol the mock upstream picks.
pub const UPSTREAM_SUBPROTOCOL: &str = "chat.v2";

/// Start a mock upstream on an ephemeral port.
///
/// - `/status/{code}` answers with that status and a JSON content type
/// - `/ws` echoes WebSocket frames after announcing the `User-Agent` it saw;
///   it speaks the `chat.v2` subprotocol when offered
/// - anything else echoes the request line, headers and body as plain text,
///   with framing restrictions set on the response
pub async fn start_mock_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/status/{code}", any(status))
        .route("/ws", get(websocket))
        .fallback(echo);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn echo(uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let mut text = format!("path: {}\n", uri);
    for (name, value) in &headers {
        text.push_str(&format!("{}: {}\n", name, value.to_str().unwrap_or("<binary>")));
    }
    text.push_str("\n");
    text.push_str(&String::from_utf8_lossy(&body));

    (
        [
            (header::CONTENT_TYPE, "text/plain"),
            (header::X_FRAME_OPTIONS, "DENY"),
            (header::CONTENT_SECURITY_POLICY, "default-src 'self'"),
        ],
        text,
    )
        .into_response()
}

async fn status(Path(code): Path<u16>) -> Response {
    (
        StatusCode::from_u16(code).unwrap(),
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
        ],
        r#"{"challenge":true}"#,
    )
        .into_response()
}

async fn websocket(headers: HeaderMap, ws: WebSocketUpgrade) -> Response {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string();

    ws.protocols([UPSTREAM_SUBPROTOCOL])
        .on_upgrade(move |socket| echo_socket(socket, user_agent))
}

async fn echo_socket(mut socket: WebSocket, user_agent: String) {
    if socket
        .send(Message::Text(format!("user-agent: {}", user_agent).into()))
        .await
        .is_err()
    {
        return;
    }
    while let Some(Ok(message)) = socket.recv().await {
        match message {
            Message::Text(_) | Message::Binary(_) => {
                if socket.send(message).await.is_err() {
                    break;
                }
            }
            // Keep reading after Close; the next read flushes the reply.
            _ => {}
        }
    }
}

/// Start the relay on an ephemeral port. Keep the returned `Shutdown` alive
/// for as long as the relay should run.
pub async fn start_relay(config: RelayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Forward mode config pointing at `upstream`.
pub fn forward_config(upstream: SocketAddr, hardened: bool) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.forward.upstream = format!("http://{}", upstream);
    config.forward.hardened = hardened;
    config
}

/// Client that never uses a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Header lines the mock upstream echoed, lowercased names.
pub fn echoed_header<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    let prefix = format!("{}: ", name);
    body.lines()
        .take_while(|line| !line.is_empty())
        .find_map(|line| line.strip_prefix(prefix.as_str()))
}
