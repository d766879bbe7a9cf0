//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers produce:
//!     → logging.rs (structured log events, pretty or JSON)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! Every request also gets an `x-request-id` (tower-http) that shows up in
//! the request span and on the response, but never on the upstream leg.

pub mod logging;
pub mod metrics;
