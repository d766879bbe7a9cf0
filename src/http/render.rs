//! Render mode: return the target page as rendered by a headless browser.

use std::time::Instant;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::observability::metrics;
use crate::render::RenderService;

/// Prefix of the body returned when rendering fails.
pub const RENDER_FAILURE_PREFIX: &str = "Error accessing site: ";

#[derive(Clone)]
pub struct RenderState {
    pub service: RenderService,
    pub failure_status: StatusCode,
}

pub async fn render_handler(State(state): State<RenderState>) -> Response {
    let start = Instant::now();

    match state.service.render_target().await {
        Ok(document) => {
            tracing::debug!(
                url = %state.service.target_url(),
                bytes = document.len(),
                "Page rendered"
            );
            metrics::record_request("render", StatusCode::OK.as_u16(), start);
            Html(document).into_response()
        }
        Err(e) => {
            tracing::error!(url = %state.service.target_url(), error = %e, "Render failed");
            metrics::record_render_failure();
            metrics::record_request("render", state.failure_status.as_u16(), start);
            (
                state.failure_status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                format!("{}{}", RENDER_FAILURE_PREFIX, e),
            )
                .into_response()
        }
    }
}
