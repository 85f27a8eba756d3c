use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Worker pool has at least one slot
/// - Tick interval is non-zero
/// - Simulated duration range is non-empty and starts at 1 or above
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.convertor.max_parallel_conversions == 0 {
        return Err(ConfigError::ValidationError(
            "convertor.max_parallel_conversions cannot be 0".to_string(),
        ));
    }

    if config.convertor.tick_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "convertor.tick_interval_ms cannot be 0".to_string(),
        ));
    }

    if config.backend.min_duration_ticks == 0 {
        return Err(ConfigError::ValidationError(
            "backend.min_duration_ticks cannot be 0".to_string(),
        ));
    }

    if config.backend.min_duration_ticks > config.backend.max_duration_ticks {
        return Err(ConfigError::ValidationError(
            "backend.min_duration_ticks cannot exceed backend.max_duration_ticks".to_string(),
        ));
    }

    Ok(())
}
