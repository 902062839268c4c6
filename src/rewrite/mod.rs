//! Response rewriting.
//!
//! The pieces that make an upstream response look like it originated from the
//! local origin: an inbound header allow-list, a public-suffix-aware cookie
//! domain resolver, and rewriters for `Location` headers, `Set-Cookie`
//! headers, and textual bodies. Each piece is a pure function over its
//! inputs; the orchestrator in [`crate::http::handler`] composes them.

pub mod body;
pub mod cookies;
pub mod headers;
pub mod location;

/// Path prefix under which the proxy is mounted in the host application.
pub const PROXY_PREFIX: &str = "/api/.ory";

pub use body::{is_likely_text, rewrite_body};
pub use cookies::{resolve_cookie_domain, rewrite_cookies, split_set_cookie};
pub use headers::filter_headers;
pub use location::rewrite_location;
