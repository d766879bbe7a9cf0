//! Web relay library.
//!
//! A single-listener relay with two modes:
//! - **render**: drive headless Chrome to a fixed page and return the
//!   rendered document
//! - **forward**: relay HTTP and WebSocket traffic under `/proxy` to a fixed
//!   upstream, rewriting a few request and response headers on the way

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod render;
pub mod security;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
