//! Shared utilities for the integration suite: a mock identity upstream and
//! a proxy instance, both bound to ephemeral ports.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

use ory_proxy::config::{HandlerOptions, ServerConfig};
use ory_proxy::http::HttpServer;

/// A small binary payload (PNG signature plus header bytes, including nulls).
pub const PNG_BYTES: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, b'I', b'H', b'D',
    b'R', 0x00, 0x00, 0x00, 0x01,
];

/// A running mock identity upstream.
pub struct MockUpstream {
    /// Base URL the upstream is reachable under (`http://127.0.0.1:<port>`).
    pub base_url: String,

    /// Number of requests the upstream has served.
    pub hits: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct UpstreamState {
    base_url: String,
    hits: Arc<AtomicUsize>,
}

/// Start a mock identity upstream on an ephemeral port. It answers a small
/// set of well-known identity-service routes and counts every request it
/// serves; redirects and cookies reference its own base URL and host, the
/// way a real upstream would emit them.
pub async fn start_upstream() -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));

    let state = UpstreamState {
        base_url: base_url.clone(),
        hits: hits.clone(),
    };

    let app = Router::new()
        .route("/health/alive", get(health_alive))
        .route("/self-service/login/browser", get(login_browser))
        .route("/self-service/login", post(login_submit))
        .route("/self-service/login/api", get(login_api))
        .route("/self-service/recovery/browser", get(recovery_browser))
        .route("/ui/ory-small.png", get(binary_asset))
        .with_state(state);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { base_url, hits }
}

/// Start the proxy with the given handler options. Returns the proxy
/// address.
pub async fn start_proxy(options: HandlerOptions) -> SocketAddr {
    let config = ServerConfig {
        handler: options,
        ..ServerConfig::default()
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    addr
}

/// HTTP client with redirects disabled, so 3xx responses can be asserted
/// directly.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

async fn health_alive(State(state): State<UpstreamState>) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"status":"ok"}"#,
    )
}

async fn login_browser(State(state): State<UpstreamState>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let upstream_host = state
        .base_url
        .trim_start_matches("http://")
        .split(':')
        .next()
        .unwrap()
        .to_owned();

    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(
            header::LOCATION,
            format!("{}/ui/login?flow=8060d57f", state.base_url),
        )
        .header(
            header::SET_COOKIE,
            format!("csrf_token_8060d57f=dG9rZW4=; Path=/; Domain={upstream_host}; SameSite=Lax; HttpOnly"),
        )
        .header(
            header::SET_COOKIE,
            "ory_session=c2Vzc2lvbg==; Path=/; HttpOnly",
        )
        .body(Body::empty())
        .unwrap()
}

async fn login_api(State(state): State<UpstreamState>) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let body = format!(
        r#"{{"id":"f81caf60","ui":{{"action":"{}/self-service/login?flow=f81caf60","method":"POST"}}}}"#,
        state.base_url
    );
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

async fn login_submit(State(state): State<UpstreamState>, body: String) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::OK, body)
}

async fn recovery_browser(State(state): State<UpstreamState>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(header::LOCATION, "/self-service/recovery?flow=5c11aa22")
        .body(Body::empty())
        .unwrap()
}

async fn binary_asset(State(state): State<UpstreamState>) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/png")],
        PNG_BYTES.to_vec(),
    )
}
