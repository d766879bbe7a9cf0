//! Headless Chrome rendering over WebDriver.
//!
//! Every render launches a fresh browser session, navigates, waits for the
//! network to go quiet, reads the document and quits the session. Sessions
//! are never reused.

use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use thirtyfour::prelude::*;

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::render::PageRenderer;

const CHROME_ARGS: &[&str] = &["--headless=new", "--no-sandbox", "--disable-setuid-sandbox"];

/// Returns the document state and the number of resources fetched so far.
const NETWORK_STATE_SCRIPT: &str =
    "return [document.readyState, performance.getEntriesByType('resource').length];";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Renders pages with a Chrome instance driven through chromedriver.
#[derive(Debug, Clone)]
pub struct WebDriverRenderer {
    webdriver_url: String,
    navigation_timeout: Duration,
    idle_window: Duration,
}

impl WebDriverRenderer {
    pub fn new(webdriver_url: impl Into<String>, navigation_timeout: Duration, idle_window: Duration) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            navigation_timeout,
            idle_window,
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(
            config.webdriver_url.clone(),
            Duration::from_secs(config.navigation_timeout_secs),
            Duration::from_millis(config.idle_window_ms),
        )
    }

    /// Start a session, giving up at `deadline`.
    ///
    /// The launch runs as its own task so that a session chromedriver
    /// creates after the deadline is still found and quit.
    async fn launch(&self, deadline: tokio::time::Instant) -> Result<WebDriver, RenderError> {
        let mut caps = DesiredCapabilities::chrome();
        for arg in CHROME_ARGS {
            caps.add_arg(arg)?;
        }

        let webdriver_url = self.webdriver_url.clone();
        let mut pending = tokio::spawn(async move { WebDriver::new(webdriver_url, caps).await });

        match tokio::time::timeout_at(deadline, &mut pending).await {
            Ok(joined) => {
                let driver = joined
                    .map_err(|e| RenderError::Other(format!("browser launch aborted: {}", e)))??;
                tracing::debug!(webdriver = %self.webdriver_url, "Browser session started");
                Ok(driver)
            }
            Err(_) => {
                tokio::spawn(async move {
                    if let Ok(Ok(driver)) = pending.await {
                        tracing::debug!("Closing browser session that started after the deadline");
                        let _ = driver.quit().await;
                    }
                });
                Err(RenderError::Timeout(self.navigation_timeout.as_secs()))
            }
        }
    }

    /// Launch, load and read under a single `navigation_timeout` deadline.
    async fn fetch(&self, url: &str) -> Result<String, RenderError> {
        let deadline = tokio::time::Instant::now() + self.navigation_timeout;
        let driver = self.launch(deadline).await?;

        let outcome = tokio::time::timeout_at(deadline, self.load(&driver, url)).await;

        // The session is torn down whatever happened above.
        if let Err(e) = driver.quit().await {
            tracing::warn!(error = %e, "Failed to close browser session");
        }

        match outcome {
            Ok(result) => result,
            Err(_) => Err(RenderError::Timeout(self.navigation_timeout.as_secs())),
        }
    }

    async fn load(&self, driver: &WebDriver, url: &str) -> Result<String, RenderError> {
        driver.goto(url).await?;
        wait_for_network_idle(driver, self.idle_window).await?;
        Ok(driver.source().await?)
    }
}

impl PageRenderer for WebDriverRenderer {
    fn render<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, RenderError>> {
        Box::pin(self.fetch(url))
    }
}

/// Wait until the document is complete and no new resource has been
/// requested for `idle_window`.
async fn wait_for_network_idle(driver: &WebDriver, idle_window: Duration) -> Result<(), RenderError> {
    let mut last_count: Option<u64> = None;
    let mut quiet_since = Instant::now();

    loop {
        let (ready_state, resources): (String, u64) =
            driver.execute(NETWORK_STATE_SCRIPT, Vec::new()).await?.convert()?;

        if ready_state == "complete" && last_count == Some(resources) {
            if quiet_since.elapsed() >= idle_window {
                tracing::trace!(resources, "Network idle");
                return Ok(());
            }
        } else {
            last_count = Some(resources);
            quiet_since = Instant::now();
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn stalled_launch_stays_within_one_deadline() {
        // Accepts connections and never answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let renderer = WebDriverRenderer::new(
            format!("http://{}", addr),
            Duration::from_secs(1),
            Duration::from_millis(100),
        );

        let started = Instant::now();
        let err = renderer.render("https://lmarena.ai").await.unwrap_err();

        assert!(matches!(err, RenderError::Timeout(1)), "unexpected error: {}", err);
        assert!(started.elapsed() < Duration::from_millis(1900));
    }
}
