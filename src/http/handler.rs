//! The proxy orchestrator.
//!
//! Forwards an inbound request to the upstream identity service and rewrites
//! the response so it appears to originate from the local origin: redirect
//! locations come back through the proxy prefix, cookies are re-issued for
//! the local host, and textual bodies have the upstream base URL substituted.
//!
//! # Responsibilities
//! - Extract the upstream path and query from the inbound request
//! - Short-circuit the hosted-UI welcome page to the application root
//! - Issue exactly one upstream call, without following redirects
//! - Assemble the rewritten response (headers, location, cookies, body)
//!
//! Exactly one upstream call is made per inbound request; failures surface
//! immediately as a 5xx-class response with no partial headers or body
//! committed.

use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;
use url::form_urlencoded;

use crate::http::request::X_REQUEST_ID;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::rewrite::{
    filter_headers, rewrite_body, rewrite_cookies, rewrite_location, PROXY_PREFIX,
};

/// Query parameter that may carry the upstream path segments when the
/// wildcard route segment is empty. Never forwarded upstream.
const PATHS_PARAM: &str = "paths";

/// Path that never reaches the upstream: the hosted-UI welcome page redirects
/// back to the application root instead.
const WELCOME_PATH: &str = "ui/welcome";

/// Relative redirect target leading from the welcome path back to the
/// application root.
const WELCOME_REDIRECT: &str = "../../../";

/// Response headers that are not copied from the upstream: `location` and
/// `set-cookie` are rewritten separately, the rest are invalidated by body
/// rewriting and must be recomputed by the transport.
const STRIPPED_RESPONSE_HEADERS: [HeaderName; 5] = [
    header::LOCATION,
    header::SET_COOKIE,
    header::TRANSFER_ENCODING,
    header::CONTENT_ENCODING,
    header::CONTENT_LENGTH,
];

/// Faults surfaced while proxying a single request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Network-level failure while contacting the upstream.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// Inbound request body could not be buffered within the configured
    /// limit.
    #[error("failed to buffer request body within {limit} bytes")]
    PayloadTooLarge { limit: usize },
}

impl ProxyError {
    fn status(&self) -> StatusCode {
        match self {
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            ProxyError::Upstream(_) => "upstream request failed",
            ProxyError::PayloadTooLarge { .. } => "request body too large",
        }
    }
}

/// Main proxy handler. Extracts the upstream target, forwards the request,
/// and assembles the rewritten response.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_owned();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "proxying request"
    );

    match forward(&state, request).await {
        Ok(response) => {
            metrics::record_request(method.as_str(), response.status().as_u16(), started);
            response
        }
        Err(error) => {
            let status = error.status();
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                error = %error,
                "proxy request failed"
            );
            metrics::record_request(method.as_str(), status.as_u16(), started);
            (status, error.public_message()).into_response()
        }
    }
}

async fn forward(state: &AppState, request: Request<Body>) -> Result<Response, ProxyError> {
    let config = &state.config;
    let (parts, body) = request.into_parts();

    let (upstream_path, forwarded_query) = split_target(&parts.uri);
    if upstream_path == WELCOME_PATH {
        // Redirected to the hosted-UI welcome page: send the browser back to
        // the application root instead of proxying it.
        return Ok(Redirect::to(WELCOME_REDIRECT).into_response());
    }

    let upstream_url = format!(
        "{}/{}?{}",
        config.upstream_base_url, upstream_path, forwarded_query
    );

    let is_tls = is_tls_request(&parts.headers);
    let host = effective_host(&parts.headers);

    let mut outbound = filter_headers(&parts.headers, &config.forward_additional_headers);
    // The upstream must not apply its own base-URL rewriting or custom-domain
    // redirects on top of ours; these markers disable both.
    outbound.insert(
        HeaderName::from_static("x-ory-base-url-rewrite"),
        HeaderValue::from_static("false"),
    );
    outbound.insert(
        HeaderName::from_static("ory-base-url-rewrite"),
        HeaderValue::from_static("false"),
    );
    outbound.insert(
        HeaderName::from_static("ory-no-custom-domain-redirect"),
        HeaderValue::from_static("true"),
    );

    let request_body = if parts.method == Method::GET || parts.method == Method::HEAD {
        None
    } else {
        let limit = state.max_body_size;
        let bytes = to_bytes(body, limit)
            .await
            .map_err(|_| ProxyError::PayloadTooLarge { limit })?;
        Some(bytes)
    };

    let mut upstream_request = state
        .client
        .request(parts.method.clone(), &upstream_url)
        .headers(outbound);
    if let Some(bytes) = request_body {
        upstream_request = upstream_request.body(bytes);
    }

    // Redirects are observed and rewritten, never followed: the redirect
    // target must be translated to the local origin before it reaches the
    // browser.
    let upstream_response = upstream_request.send().await?;

    let status = upstream_response.status();
    let upstream_headers = upstream_response.headers().clone();
    let payload = upstream_response.bytes().await?;

    let mut headers = HeaderMap::with_capacity(upstream_headers.len());
    for (name, value) in &upstream_headers {
        if STRIPPED_RESPONSE_HEADERS.contains(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    if let Some(location) = upstream_headers
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
    {
        let rewritten = rewrite_location(location, &config.upstream_base_url);
        if let Ok(value) = HeaderValue::from_str(&rewritten) {
            headers.insert(header::LOCATION, value);
        }
    }

    for raw in upstream_headers.get_all(header::SET_COOKIE) {
        let raw = String::from_utf8_lossy(raw.as_bytes());
        for rewritten in rewrite_cookies(&raw, host, is_tls, config) {
            if let Ok(value) = HeaderValue::from_str(&rewritten) {
                headers.append(header::SET_COOKIE, value);
            }
        }
    }

    let body = rewrite_body(payload, &config.upstream_base_url);

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

/// Extract the upstream path and the forwarded query string from the inbound
/// URI.
///
/// The path comes from the wildcard route segment under the proxy prefix or,
/// when that is empty, from the multi-value `paths` query parameter joined
/// with `/`. That parameter is excluded from the forwarded query; every other
/// parameter is forwarded verbatim.
fn split_target(uri: &Uri) -> (String, String) {
    let path = uri
        .path()
        .strip_prefix(PROXY_PREFIX)
        .unwrap_or_else(|| uri.path())
        .trim_start_matches('/')
        .to_owned();

    let mut path_segments = Vec::new();
    let mut forwarded = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes()) {
        if key == PATHS_PARAM {
            path_segments.push(value.into_owned());
        } else {
            forwarded.append_pair(&key, &value);
        }
    }

    let path = if path.is_empty() {
        path_segments.join("/")
    } else {
        path
    };
    (path, forwarded.finish())
}

/// Effective request host, preferring `x-forwarded-host` set by a fronting
/// proxy over the direct `host` header.
fn effective_host(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(header::HOST))
        .and_then(|value| value.to_str().ok())
}

/// Whether the inbound request arrived over TLS, as reported by the fronting
/// proxy.
fn is_tls_request(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .map(|proto| proto.eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}
