//! Render mode subsystem.
//!
//! # Data Flow
//! ```text
//! GET /
//!     → pool.rs (wait for a browser session slot)
//!     → browser.rs (launch, navigate, wait for network idle, read, quit)
//!     → rendered HTML, or RenderError
//! ```

pub mod browser;
pub mod pool;

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::config::RenderConfig;
use crate::error::RenderError;

pub use browser::WebDriverRenderer;
pub use pool::{SessionPermit, SessionPool};

/// Something that turns a URL into a rendered document.
pub trait PageRenderer: Send + Sync {
    fn render<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, RenderError>>;
}

/// Renders the configured target page through a bounded session pool.
#[derive(Clone)]
pub struct RenderService {
    renderer: Arc<dyn PageRenderer>,
    pool: SessionPool,
    target_url: String,
}

impl RenderService {
    pub fn new(renderer: Arc<dyn PageRenderer>, pool: SessionPool, target_url: impl Into<String>) -> Self {
        Self {
            renderer,
            pool,
            target_url: target_url.into(),
        }
    }

    /// Service backed by headless Chrome, as configured.
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(
            Arc::new(WebDriverRenderer::from_config(config)),
            SessionPool::new(config.max_sessions),
            config.target_url.clone(),
        )
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn pool(&self) -> &SessionPool {
        &self.pool
    }

    /// Render the target page. The session slot is held for the whole render.
    pub async fn render_target(&self) -> Result<String, RenderError> {
        let _permit = self.pool.acquire().await?;
        self.renderer.render(&self.target_url).await
    }
}
