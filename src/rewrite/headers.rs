//! Inbound request header filtering.
//!
//! Only a fixed allow-list of headers, plus any extras configured on the
//! handler, is forwarded to the upstream. Everything else is silently
//! dropped; there are no error conditions.

use axum::http::HeaderMap;

/// Headers forwarded upstream by default. Names are lowercase, matching the
/// normalization the http crate applies to header names.
pub const DEFAULT_FORWARDED_HEADERS: [&str; 11] = [
    "accept",
    "accept-charset",
    "accept-encoding",
    "accept-language",
    "authorization",
    "cache-control",
    "content-type",
    "cookie",
    "host",
    "user-agent",
    "referer",
];

/// Build the outbound header map from the inbound one, keeping only
/// allow-listed entries. Multi-valued headers keep all their values.
pub fn filter_headers(headers: &HeaderMap, extra_allowed: &[String]) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let allowed = DEFAULT_FORWARDED_HEADERS.contains(&name.as_str())
            || extra_allowed
                .iter()
                .any(|extra| extra.eq_ignore_ascii_case(name.as_str()));
        if allowed {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn inbound() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("application/json"));
        headers.insert("filtered", HeaderValue::from_static("any"));
        headers.insert("x-custom", HeaderValue::from_static("some"));
        headers
    }

    #[test]
    fn keeps_only_allow_listed_headers() {
        let filtered = filter_headers(&inbound(), &[]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.get("accept").unwrap(), "application/json");
    }

    #[test]
    fn forwards_configured_additional_headers() {
        let filtered = filter_headers(&inbound(), &["x-custom".to_owned()]);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.get("x-custom").unwrap(), "some");
        assert!(filtered.get("filtered").is_none());
    }

    #[test]
    fn additional_header_names_match_case_insensitively() {
        let filtered = filter_headers(&inbound(), &["X-Custom".to_owned()]);
        assert_eq!(filtered.get("x-custom").unwrap(), "some");
    }

    #[test]
    fn keeps_every_value_of_multi_valued_headers() {
        let mut headers = HeaderMap::new();
        headers.append("cookie", HeaderValue::from_static("a=1"));
        headers.append("cookie", HeaderValue::from_static("b=2"));
        let filtered = filter_headers(&headers, &[]);
        assert_eq!(filtered.get_all("cookie").iter().count(), 2);
    }
}
