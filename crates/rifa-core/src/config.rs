use serde::{Deserialize, Serialize};

/// Configuration for the settlement engine and its operator tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the data directory.
    pub data_dir: String,
    /// How long a ticket reservation is held before it expires (seconds).
    pub reservation_ttl_secs: u64,
    /// Interval between background expiry sweeps (seconds).
    pub sweep_interval_secs: u64,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".into(),
            reservation_ttl_secs: 300,
            sweep_interval_secs: 30,
            log_level: "info".into(),
        }
    }
}

impl EngineConfig {
    /// Reservation TTL as a `chrono::Duration`.
    pub fn reservation_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.reservation_ttl_secs as i64)
    }
}
