//! HTTP subsystem: server glue and the proxy orchestrator.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → server.rs (router, request ID, tracing, timeout)
//!     → handler.rs (path/query extraction, header allow-list)
//!     → upstream call (single hop, redirects not followed)
//!     → rewrite (location, set-cookie, body)
//!     → response emitted
//! ```

pub mod handler;
pub mod request;
pub mod server;

pub use handler::ProxyError;
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
