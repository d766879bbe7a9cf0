//! Bounded browser session admission.
//!
//! # Responsibilities
//! - Cap the number of live browser sessions
//! - Queue excess render requests in arrival order
//! - Release the slot when the render finishes, fails or is cancelled

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::RenderError;

/// A FIFO pool of browser session slots.
///
/// Tokio's semaphore is fair, so waiting renders are served in the order
/// they arrived.
#[derive(Debug, Clone)]
pub struct SessionPool {
    permits: Arc<Semaphore>,
    max_sessions: usize,
}

impl SessionPool {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_sessions)),
            max_sessions,
        }
    }

    /// Wait for a free session slot.
    pub async fn acquire(&self) -> Result<SessionPermit, RenderError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| RenderError::Other("browser session pool closed".to_string()))?;

        tracing::debug!(
            available = self.permits.available_permits(),
            max_sessions = self.max_sessions,
            "Browser session slot acquired"
        );

        Ok(SessionPermit { _permit: permit })
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// A held session slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct SessionPermit {
    _permit: OwnedSemaphorePermit,
}
