//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! [`HandlerOptions`] is the construction-time option bag; [`HandlerConfig`]
//! is the resolved, immutable configuration shared by every request a handler
//! processes. Environment variables are read exactly once, during
//! [`HandlerConfig::resolve`] — nothing downstream touches global state.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::loader::ConfigError;

/// Environment variable holding the upstream base URL.
pub const SDK_URL_ENV: &str = "ORY_SDK_URL";

/// Legacy environment variable for the upstream base URL. Mutually exclusive
/// with [`SDK_URL_ENV`].
pub const LEGACY_SDK_URL_ENV: &str = "ORY_KRATOS_URL";

/// Upstream used when `fallback_to_playground` is enabled and no explicit
/// URL is configured.
pub const PLAYGROUND_URL: &str = "https://playground.projects.oryapis.com";

/// Root configuration for the proxy server binary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Proxy handler options.
    pub handler: HandlerOptions,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_owned(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout towards the upstream in seconds.
    pub connect_secs: u64,

    /// Total request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound request body size in bytes. Requests exceeding it are
    /// rejected with 413 before any upstream call is made.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_owned(),
        }
    }
}

/// Construction-time options for the proxy handler.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HandlerOptions {
    /// Overrides the upstream base URL. Usually the URL is taken from the
    /// `ORY_SDK_URL` environment variable.
    pub api_base_url_override: Option<String>,

    /// Force a fixed cookie domain instead of deriving it from the request
    /// host. Useful when the app runs on a subdomain and session/CSRF cookies
    /// must be valid for the whole registrable domain. Disables TLD guessing.
    pub force_cookie_domain: Option<String>,

    /// By default cookies are scoped to the host's registrable domain: an app
    /// on www.example.org sets cookies for example.org. Set to true to leave
    /// the domain attribute empty instead, scoping cookies to the exact host.
    pub dont_use_tld_for_cookie_domain: bool,

    /// Force the `Secure` flag on all cookies instead of deriving it from the
    /// inbound TLS state.
    pub force_cookie_secure: Option<bool>,

    /// Additional request headers to forward upstream on top of the fixed
    /// allow-list.
    pub forward_additional_headers: Vec<String>,

    /// Fall back to the hosted playground upstream when no explicit URL is
    /// configured.
    pub fallback_to_playground: bool,
}

/// Resolved, immutable configuration shared by every request a handler
/// processes.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Absolute upstream base URL, without a trailing slash.
    pub upstream_base_url: String,

    /// Fixed cookie domain override. Disables registrable-domain guessing.
    pub force_cookie_domain: Option<String>,

    /// Leave the cookie domain attribute empty instead of guessing it.
    pub dont_use_tld_for_cookie_domain: bool,

    /// Override for the TLS-derived `Secure` cookie flag.
    pub force_cookie_secure: Option<bool>,

    /// Extra forwarded header names, lowercased.
    pub forward_additional_headers: Vec<String>,
}

impl HandlerConfig {
    /// Resolve the handler configuration, reading the environment exactly
    /// once. Fails before any request is accepted when the base-URL sources
    /// conflict, none is configured, or the configured URL is not absolute.
    pub fn resolve(options: HandlerOptions) -> Result<Self, ConfigError> {
        let sdk_url = std::env::var(SDK_URL_ENV).ok().filter(|v| !v.is_empty());
        let legacy_url = std::env::var(LEGACY_SDK_URL_ENV)
            .ok()
            .filter(|v| !v.is_empty());
        Self::resolve_with_env(options, sdk_url, legacy_url)
    }

    fn resolve_with_env(
        options: HandlerOptions,
        sdk_url: Option<String>,
        legacy_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        if sdk_url.is_some() && legacy_url.is_some() {
            return Err(ConfigError::ConflictingBaseUrls);
        }

        let HandlerOptions {
            api_base_url_override,
            force_cookie_domain,
            dont_use_tld_for_cookie_domain,
            force_cookie_secure,
            forward_additional_headers,
            fallback_to_playground,
        } = options;

        let base_url = api_base_url_override
            .or(sdk_url)
            .or(legacy_url)
            .or_else(|| fallback_to_playground.then(|| PLAYGROUND_URL.to_owned()))
            .ok_or(ConfigError::MissingBaseUrl)?;
        let base_url = base_url.trim_end_matches('/').to_owned();

        Url::parse(&base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: base_url.clone(),
            source,
        })?;

        Ok(Self {
            upstream_base_url: base_url,
            force_cookie_domain,
            dont_use_tld_for_cookie_domain,
            force_cookie_secure,
            forward_additional_headers: forward_additional_headers
                .into_iter()
                .map(|name| name.to_ascii_lowercase())
                .collect(),
        })
    }
}
