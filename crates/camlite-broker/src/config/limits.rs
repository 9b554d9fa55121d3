//! Limits configuration.

use serde::Deserialize;

/// Default maximum packet body size (8MB).
///
/// Sized for base64-encoded camera frames, which routinely exceed the
/// 1MB a text-oriented broker would allow.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 8 * 1024 * 1024;

/// Default maximum concurrent connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

/// Limits configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum packet body (remaining length) in bytes. A frame claiming
    /// more is rejected before its body is buffered and the connection
    /// is closed.
    #[serde(default = "default_max_packet_size")]
    pub max_packet_size: usize,

    /// Maximum concurrent connections. Sockets accepted beyond this are
    /// dropped immediately.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_max_packet_size() -> usize {
    DEFAULT_MAX_PACKET_SIZE
}
fn default_max_connections() -> usize {
    DEFAULT_MAX_CONNECTIONS
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl LimitsConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_packet_size == 0 {
            return Err("limits.max_packet_size must be greater than 0".to_string());
        }
        if self.max_connections == 0 {
            return Err("limits.max_connections must be greater than 0".to_string());
        }
        Ok(())
    }
}
