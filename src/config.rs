//! Runtime configuration, read from the environment.
//!
//! A `.env` file in the working directory is loaded first when present.

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::router::DEFAULT_MARKER;
use crate::DEFAULT_MIME_TYPE;

pub const BIND_VAR: &str = "LOCALVIDEO_BIND";
pub const MARKER_VAR: &str = "LOCALVIDEO_MARKER";
pub const CLIENT_HEADER_VAR: &str = "LOCALVIDEO_CLIENT_HEADER";
pub const DEFAULT_MIME_VAR: &str = "LOCALVIDEO_DEFAULT_MIME";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} is not a socket address: {source}")]
    Bind {
        var: &'static str,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("{var} is not a valid header name: {source}")]
    ClientHeader {
        var: &'static str,
        #[source]
        source: axum::http::header::InvalidHeaderName,
    },
    #[error("{var} must be a single non-empty path segment, got {value:?}")]
    Marker { var: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Address the demo server listens on
    pub bind: SocketAddr,
    /// Reserved final path segment answered locally
    pub marker: String,
    /// Request header carrying the client identity
    pub client_header: HeaderName,
    /// MIME type for payloads that report none
    pub default_mime_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            marker: DEFAULT_MARKER.to_string(),
            client_header: HeaderName::from_static("x-client-id"),
            default_mime_type: DEFAULT_MIME_TYPE.to_string(),
        }
    }
}

impl Config {
    /// Load `.env` if there is one, then read the environment.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(_) => tracing::debug!("no .env file found"),
        }
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(bind) = lookup(BIND_VAR) {
            config.bind = bind
                .parse()
                .map_err(|source| ConfigError::Bind { var: BIND_VAR, source })?;
        }

        if let Some(marker) = lookup(MARKER_VAR) {
            if marker.is_empty() || marker.contains('/') {
                return Err(ConfigError::Marker { var: MARKER_VAR, value: marker });
            }
            config.marker = marker;
        }

        if let Some(header) = lookup(CLIENT_HEADER_VAR) {
            config.client_header = HeaderName::from_bytes(header.as_bytes())
                .map_err(|source| ConfigError::ClientHeader { var: CLIENT_HEADER_VAR, source })?;
        }

        if let Some(mime) = lookup(DEFAULT_MIME_VAR).filter(|mime| !mime.is_empty()) {
            config.default_mime_type = mime;
        }

        Ok(config)
    }
}
