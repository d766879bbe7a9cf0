//! Stopping the relay.
//!
//! The server stops on whichever comes first: a process signal, or an
//! explicit [`Shutdown::trigger`] (used by tests and embedders).

use tokio::sync::broadcast;

use crate::lifecycle::signals::wait_for_signal;

/// Broadcast handle that asks every subscribed server to stop.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask subscribers to stop. Returns how many were listening.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once the process is signalled or `rx` hears a trigger.
///
/// A dropped coordinator counts as a trigger.
pub async fn stop_requested(mut rx: broadcast::Receiver<()>) {
    tokio::select! {
        _ = wait_for_signal() => {}
        _ = rx.recv() => {
            tracing::info!("Shutdown requested");
        }
    }
}
