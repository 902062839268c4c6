//! `Location` header rewriting.

use super::PROXY_PREFIX;

/// Upstream-relative path prefixes known to belong to the identity service.
/// `/api/kratos/public/` is kept for compatibility with older deployments.
const UPSTREAM_RELATIVE_PREFIXES: [&str; 3] = ["/api/kratos/public/", "/self-service/", "/ui/"];

/// Rewrite a `Location` header value so redirects targeting the upstream come
/// back through the local proxy prefix. External redirect targets pass
/// through verbatim.
pub fn rewrite_location(location: &str, upstream_base_url: &str) -> String {
    if let Some(rest) = location.strip_prefix(upstream_base_url) {
        return format!("{PROXY_PREFIX}{rest}");
    }

    if UPSTREAM_RELATIVE_PREFIXES
        .iter()
        .any(|prefix| location.starts_with(prefix))
    {
        return format!("{PROXY_PREFIX}{location}");
    }

    location.to_owned()
}
