//! Render mode tests with stand-in renderers.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use futures_util::future::BoxFuture;
use tower::ServiceExt;

use web_relay::config::RelayMode;
use web_relay::error::RenderError;
use web_relay::render::{PageRenderer, RenderService, SessionPool};
use web_relay::{HttpServer, RelayConfig};

struct StaticRenderer;

impl PageRenderer for StaticRenderer {
    fn render<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, RenderError>> {
        Box::pin(async move { Ok(format!("<html><body>{}</body></html>", url)) })
    }
}

struct FailingRenderer;

impl PageRenderer for FailingRenderer {
    fn render<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Result<String, RenderError>> {
        Box::pin(async { Err(RenderError::Other("net::ERR_NAME_NOT_RESOLVED".to_string())) })
    }
}

fn render_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.mode = RelayMode::Render;
    config
}

fn server_with(config: RelayConfig, renderer: Arc<dyn PageRenderer>) -> HttpServer {
    let service = RenderService::new(renderer, SessionPool::new(1), config.render.target_url.clone());
    HttpServer::with_render_service(config, service)
}

async fn get(server: &HttpServer, path: &str) -> (StatusCode, Option<String>, String) {
    let response = server
        .router()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_rendered_document_returned_as_html() {
    let server = server_with(render_config(), Arc::new(StaticRenderer));

    let (status, content_type, body) = get(&server, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    assert_eq!(body, "<html><body>https://lmarena.ai</body></html>");
}

#[tokio::test]
async fn test_render_failure_reported_with_ok_status() {
    let server = server_with(render_config(), Arc::new(FailingRenderer));

    let (status, content_type, body) = get(&server, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain"));
    assert!(body.starts_with("Error accessing site: "));
    assert!(body.contains("net::ERR_NAME_NOT_RESOLVED"));
}

#[tokio::test]
async fn test_configured_failure_status() {
    let mut config = render_config();
    config.render.failure_status = 502;
    let server = server_with(config, Arc::new(FailingRenderer));

    let (status, _, body) = get(&server, "/").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.starts_with("Error accessing site: "));
}

#[tokio::test]
async fn test_only_root_is_served() {
    let server = server_with(render_config(), Arc::new(StaticRenderer));

    let (status, _, _) = get(&server, "/proxy/anything").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unreachable_webdriver_reports_failure() {
    // Nothing listens on the freed port, so the session cannot start.
    let dead = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let mut config = render_config();
    config.render.webdriver_url = format!("http://{}", dead);
    config.render.navigation_timeout_secs = 5;
    let server = HttpServer::new(config).unwrap();

    let (status, _, body) = get(&server, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("Error accessing site: "));
}
