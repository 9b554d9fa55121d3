//! Session / keep-alive configuration.

use serde::Deserialize;

/// Default keep-alive sweep interval in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 1;

/// Session configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How often the keep-alive supervisor scans connections, in seconds.
    /// A connection silent for more than 1.5x its declared keep-alive is
    /// closed on the next sweep.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_sweep_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sweep_interval_secs == 0 {
            return Err("session.sweep_interval_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}
