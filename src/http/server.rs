//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router for the configured relay mode
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Serve until a shutdown signal arrives

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{RelayConfig, RelayMode};
use crate::error::ServerError;
use crate::http::forward::{forward_handler, ForwardState};
use crate::http::portal::portal_handler;
use crate::http::render::{render_handler, RenderState};
use crate::lifecycle::stop_requested;
use crate::render::RenderService;
use crate::security::headers::X_REQUEST_ID;

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        let routes = match config.mode {
            RelayMode::Render => Self::render_routes(&config, RenderService::from_config(&config.render)),
            RelayMode::Forward => Self::forward_routes(ForwardState::new(&config.forward)?),
        };
        Ok(Self::assemble(routes, config))
    }

    /// Render mode server using the given render service instead of headless Chrome.
    pub fn with_render_service(config: RelayConfig, service: RenderService) -> Self {
        let routes = Self::render_routes(&config, service);
        Self::assemble(routes, config)
    }

    fn render_routes(config: &RelayConfig, service: RenderService) -> Router {
        let failure_status =
            StatusCode::from_u16(config.render.failure_status).unwrap_or(StatusCode::OK);
        Router::new()
            .route("/", get(render_handler))
            .with_state(RenderState {
                service,
                failure_status,
            })
    }

    fn forward_routes(state: ForwardState) -> Router {
        Router::new()
            .route("/", get(portal_handler))
            .fallback(forward_handler)
            .with_state(state)
    }

    /// Attach the middleware stack shared by both modes.
    fn assemble(routes: Router, config: RelayConfig) -> Self {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID));

        Self {
            router: routes.layer(middleware),
            config,
        }
    }

    /// The assembled router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires or the process is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mode = %self.config.mode,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(stop_requested(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
