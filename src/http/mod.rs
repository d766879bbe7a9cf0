//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Render mode:
//!     GET / → render.rs → render::RenderService → rendered HTML
//!
//! Forward mode:
//!     GET /        → portal.rs (landing page)
//!     * /proxy/... → forward.rs
//!                      → request.rs (prefix strip, changeOrigin, outbound policy)
//!                      → upstream (reqwest) or websocket.rs (upgrade)
//!                      → response.rs (inbound policy, streamed body)
//! ```

pub mod forward;
pub mod portal;
pub mod render;
pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use server::HttpServer;
