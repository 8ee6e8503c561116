//! Server configuration.

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::domain::DEFAULT_HISTORY_CAPACITY;

/// Default port, matching the port web clients expect out of the box
pub const DEFAULT_PORT: u16 = 3001;

/// Default heartbeat period (5 minutes)
pub const DEFAULT_HEARTBEAT_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid CORS origin '{0}'")]
    InvalidCorsOrigin(String),
}

/// Deployment settings of the relay. None of them change chat semantics.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty or `*` allows any origin
    pub cors_origins: Vec<String>,
    /// Number of messages replayed to joiners
    pub history_capacity: usize,
    /// Period of the heartbeat log; `None` disables it
    pub heartbeat_interval: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            cors_origins: Vec::new(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            heartbeat_interval: Some(Duration::from_secs(DEFAULT_HEARTBEAT_SECS)),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|origin| origin == "*")
    }

    /// Build the CORS layer for the configured origins.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCorsOrigin`] if an origin is not a valid header value.
    pub fn cors_layer(&self) -> Result<CorsLayer, ConfigError> {
        let allow_origin = if self.allows_any_origin() {
            AllowOrigin::from(Any)
        } else {
            let origins = self
                .cors_origins
                .iter()
                .map(|origin| {
                    HeaderValue::from_str(origin.trim())
                        .map_err(|_| ConfigError::InvalidCorsOrigin(origin.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            AllowOrigin::list(origins)
        };

        Ok(CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any))
    }
}
