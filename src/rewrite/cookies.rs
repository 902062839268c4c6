//! `Set-Cookie` rewriting and cookie-domain resolution.
//!
//! Upstream cookies are re-issued for the local origin: the `Domain`
//! attribute is derived from the effective request host using the public
//! suffix list, the `Secure` flag follows the inbound TLS state, and every
//! other attribute passes through untouched. Values are emitted raw since the
//! upstream already encoded them.

use cookie::Cookie;
use url::{Host, Url};

use crate::config::HandlerConfig;

/// Derive the cookie `Domain` attribute from the effective request host.
///
/// Returns `None` when the cookie should carry no explicit domain: IP
/// literals, unparsable hosts, or the `dont_use_tld_for_cookie_domain`
/// option. Hosts without a registrable domain (bare `localhost`) fall back to
/// the hostname itself so cookies still stick in local setups. Ports, paths,
/// and URL schemes in the input are tolerated and ignored.
pub fn resolve_cookie_domain(host: Option<&str>, config: &HandlerConfig) -> Option<String> {
    if config.force_cookie_domain.is_some() || host.map_or(true, str::is_empty) {
        return config.force_cookie_domain.clone();
    }
    if config.dont_use_tld_for_cookie_domain {
        return None;
    }

    let raw = host?;
    let url = if raw.contains("://") {
        Url::parse(raw)
    } else {
        Url::parse(&format!("http://{raw}"))
    }
    .ok()?;

    match url.host()? {
        Host::Ipv4(_) | Host::Ipv6(_) => None,
        Host::Domain(name) => Some(psl::domain_str(name).unwrap_or(name).to_owned()),
    }
}

/// Split a combined `Set-Cookie` header value into individual cookie strings.
///
/// A comma only terminates a cookie when what follows looks like the start of
/// a new `name=value` pair; commas inside `Expires` dates stay within the
/// current cookie.
pub fn split_set_cookie(value: &str) -> Vec<String> {
    let bytes = value.as_bytes();
    let mut cookies = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] == b',' {
            let mut ahead = pos + 1;
            while ahead < bytes.len() && matches!(bytes[ahead], b' ' | b'\t') {
                ahead += 1;
            }

            let mut probe = ahead;
            let mut starts_pair = false;
            while probe < bytes.len() {
                match bytes[probe] {
                    b'=' => {
                        starts_pair = probe > ahead;
                        break;
                    }
                    b';' | b',' | b' ' | b'\t' => break,
                    _ => probe += 1,
                }
            }

            if starts_pair {
                let piece = value[start..pos].trim();
                if !piece.is_empty() {
                    cookies.push(piece.to_owned());
                }
                start = ahead;
                pos = ahead;
                continue;
            }
        }
        pos += 1;
    }

    let piece = value[start..].trim();
    if !piece.is_empty() {
        cookies.push(piece.to_owned());
    }
    cookies
}

/// Rewrite every cookie in a raw `Set-Cookie` header value for the local
/// origin.
///
/// Output order matches input order. Unparsable fragments are dropped with a
/// warning rather than forwarded or treated as fatal.
pub fn rewrite_cookies(
    raw: &str,
    effective_host: Option<&str>,
    is_tls: bool,
    config: &HandlerConfig,
) -> Vec<String> {
    let secure = config.force_cookie_secure.unwrap_or(is_tls);
    let domain = resolve_cookie_domain(effective_host, config);

    split_set_cookie(raw)
        .into_iter()
        .filter_map(|fragment| match Cookie::parse(fragment) {
            Ok(parsed) => Some(rewrite_cookie(&parsed, domain.as_deref(), secure).to_string()),
            Err(error) => {
                tracing::warn!(%error, "dropping unparsable set-cookie fragment");
                None
            }
        })
        .collect()
}

/// Re-issue one parsed cookie with the domain and secure flag overridden.
/// The value is carried over verbatim, without additional encoding.
fn rewrite_cookie(parsed: &Cookie<'_>, domain: Option<&str>, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(parsed.name().to_owned(), parsed.value().to_owned());
    if let Some(domain) = domain {
        cookie.set_domain(domain.to_owned());
    }
    cookie.set_secure(Some(secure));
    if let Some(path) = parsed.path() {
        cookie.set_path(path.to_owned());
    }
    if let Some(expires) = parsed.expires() {
        cookie.set_expires(expires);
    }
    if let Some(max_age) = parsed.max_age() {
        cookie.set_max_age(max_age);
    }
    if let Some(http_only) = parsed.http_only() {
        cookie.set_http_only(http_only);
    }
    if let Some(same_site) = parsed.same_site() {
        cookie.set_same_site(same_site);
    }
    cookie
}
