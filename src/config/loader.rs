//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// Errors surfaced while loading or resolving configuration. All of these
/// abort handler construction before any request is accepted.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Both the current and the legacy base-URL environment variables are
    /// set.
    #[error("only one of ORY_SDK_URL or ORY_KRATOS_URL can be set")]
    ConflictingBaseUrls,

    /// No override, no environment variable, and the playground fallback is
    /// disabled.
    #[error("no upstream base URL configured and the playground fallback is disabled")]
    MissingBaseUrl,

    /// The configured base URL is not an absolute URL.
    #[error("invalid upstream base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file could not be parsed.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The shared upstream HTTP client could not be constructed.
    #[error("failed to build upstream HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Load the server configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ServerConfig = toml::from_str(&content)?;
    Ok(config)
}
