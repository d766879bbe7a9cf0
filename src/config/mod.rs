//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults or config file (TOML)
//!     → loader.rs (parse & deserialize, environment overlay)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc with the handlers
//! ```
//!
//! # Design Decisions
//! - Config is built once at startup and never mutated afterwards
//! - All fields have defaults, so the relay runs with no file at all
//! - Only `PORT` and `RELAY_MODE` are read from the environment

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::{
    ForwardConfig, ListenerConfig, LogFormat, ObservabilityConfig, RelayConfig, RelayMode,
    RenderConfig,
};
pub use validation::{validate_config, ValidationError};
