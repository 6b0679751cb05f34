use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Worker pool has at least one slot
/// - Engine command is non-empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.pool.max_workers == 0 {
        return Err(ConfigError::ValidationError(
            "pool.max_workers must be at least 1".to_string(),
        ));
    }

    if config.engine.command.program.is_empty() {
        return Err(ConfigError::ValidationError(
            "engine.command.program cannot be empty".to_string(),
        ));
    }

    if let Some(0) = config.processor.timeout_secs {
        return Err(ConfigError::ValidationError(
            "processor.timeout_secs must be positive when set".to_string(),
        ));
    }

    Ok(())
}
