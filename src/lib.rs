//! Reverse-proxy adapter for Ory identity APIs.
//!
//! Mounts a remote identity service under the local origin (`/api/.ory`) and
//! rewrites redirect locations, cookies, and response bodies so that
//! browser-set cookies and CSRF tokens stay same-origin.
//!
//! # Architecture Overview
//!
//! ```text
//! inbound request
//!     → http::server   (router, request ID, tracing, timeout)
//!     → http::handler  (path/query extraction, header allow-list,
//!                       welcome-redirect short-circuit)
//!     → upstream call  (single hop, redirects not followed, gzip accepted)
//!     → rewrite        (location, set-cookie, body)
//!     → response emitted under the local origin
//! ```
//!
//! The handler configuration is resolved once at construction time and is
//! immutable afterwards; requests share it without synchronization.

pub mod config;
pub mod http;
pub mod observability;
pub mod rewrite;

pub use config::{HandlerConfig, HandlerOptions, ServerConfig};
pub use http::HttpServer;
pub use rewrite::PROXY_PREFIX;
