//! Convertor configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the conversion job manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertorConfig {
    /// Maximum conversions running in parallel; further jobs queue for a
    /// worker slot (still cancellable while queued).
    #[serde(default = "default_max_parallel")]
    pub max_parallel_conversions: usize,

    /// Interval between progress ticks (milliseconds). A job sleeps between
    /// ticks and checks for cancellation at every wake-up.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    /// How long shutdown waits for each cancelled job to acknowledge
    /// (milliseconds) before aborting its worker task.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_ms: u64,
}

fn default_max_parallel() -> usize {
    4
}

fn default_tick_interval() -> u64 {
    1000 // 1 second
}

fn default_shutdown_grace() -> u64 {
    5000 // 5 seconds
}

impl Default for ConvertorConfig {
    fn default() -> Self {
        Self {
            max_parallel_conversions: default_max_parallel(),
            tick_interval_ms: default_tick_interval(),
            shutdown_grace_ms: default_shutdown_grace(),
        }
    }
}

/// Configuration for the simulated conversion backend.
///
/// The backend picks a random duration in
/// `min_duration_ticks..=max_duration_ticks` for each job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedBackendConfig {
    /// Minimum simulated duration in ticks.
    #[serde(default = "default_min_ticks")]
    pub min_duration_ticks: u64,

    /// Maximum simulated duration in ticks.
    #[serde(default = "default_max_ticks")]
    pub max_duration_ticks: u64,
}

fn default_min_ticks() -> u64 {
    5
}

fn default_max_ticks() -> u64 {
    25
}

impl Default for SimulatedBackendConfig {
    fn default() -> Self {
        Self {
            min_duration_ticks: default_min_ticks(),
            max_duration_ticks: default_max_ticks(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConvertorConfig::default();
        assert_eq!(config.max_parallel_conversions, 4);
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.shutdown_grace_ms, 5000);
    }

    #[test]
    fn test_deserialize_minimal() {
        let toml = r#"
            tick_interval_ms = 50
        "#;
        let config: ConvertorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.tick_interval_ms, 50);
        assert_eq!(config.max_parallel_conversions, 4);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            max_parallel_conversions = 8
            tick_interval_ms = 250
            shutdown_grace_ms = 1000
        "#;
        let config: ConvertorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_parallel_conversions, 8);
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.shutdown_grace_ms, 1000);
    }

    #[test]
    fn test_default_backend_config() {
        let config = SimulatedBackendConfig::default();
        assert_eq!(config.min_duration_ticks, 5);
        assert_eq!(config.max_duration_ticks, 25);
    }
}
