//! Error types shared by the relay handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failure while producing a rendered page.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("browser session failed: {0}")]
    Browser(#[from] thirtyfour::error::WebDriverError),

    #[error("navigation timeout of {0} seconds exceeded")]
    Timeout(u64),

    #[error("{0}")]
    Other(String),
}

/// Failure while relaying a request to the upstream.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("upstream websocket handshake failed: {0}")]
    Handshake(Box<tokio_tungstenite::tungstenite::Error>),
}

impl ForwardError {
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            ForwardError::Upstream(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::Upstream(_) | ForwardError::Handshake(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ForwardError::InvalidTarget(_) => "Invalid proxy target",
            ForwardError::Upstream(_) | ForwardError::Handshake(_) => "Upstream request failed",
        };
        (status, message).into_response()
    }
}

/// Failure while assembling the server at startup.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid upstream origin `{0}`")]
    Upstream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
