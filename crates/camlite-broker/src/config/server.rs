//! Server configuration.

use std::net::SocketAddr;

use serde::Deserialize;

/// Default TCP bind address.
pub const DEFAULT_BIND: &str = "0.0.0.0:1883";

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP bind address.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

fn default_bind() -> SocketAddr {
    DEFAULT_BIND.parse().unwrap()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}
