//! Header rewriting for forwarded traffic.
//!
//! # Data Flow
//! ```text
//! Client request:
//!     → strip hop-by-hop headers
//!     → HeaderPolicy::outbound (drop X-Forwarded-*, browser-like headers)
//!     → upstream
//!
//! Upstream response:
//!     → strip hop-by-hop headers
//!     → HeaderPolicy::inbound (drop framing restrictions, 403/503 content type)
//!     → client
//! ```

pub mod headers;

pub use headers::{strip_hop_by_hop, HeaderPolicy, HeaderRule};
