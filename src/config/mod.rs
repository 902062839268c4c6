//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + environment variables + constructor options
//!     → loader.rs (parse & deserialize)
//!     → schema.rs (HandlerConfig::resolve — precedence, validation)
//!     → HandlerConfig (resolved, immutable)
//!     → shared via Arc with every request
//! ```
//!
//! # Design Decisions
//! - All environment-derived configuration is collected in the one-time
//!   resolution step; nothing downstream reads global state
//! - All fields have defaults to allow minimal configs
//! - Conflicting base-URL sources fail fast, at construction time

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::{HandlerConfig, HandlerOptions, ServerConfig};
