//! Logging setup
//!
//! Installs a `tracing` subscriber for binaries. Library crates only emit
//! events and never install a subscriber themselves.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (e.g., "info", "debug", "trace")
    pub level: String,
    /// Whether to use JSON format (vs. human-readable)
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            level: config.level.clone(),
            json: config.json,
        }
    }
}

/// Initialize logging for the application
///
/// `RUST_LOG` takes precedence over the configured level. Should be called
/// once at startup; a second call returns without touching the global
/// subscriber.
///
/// # Example
///
/// ```
/// use agent_core::logging::{init_logging, LogConfig};
///
/// init_logging(LogConfig {
///     level: "debug".to_string(),
///     json: false,
/// });
/// ```
pub fn init_logging(config: LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let installed = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .try_init()
    };

    match installed {
        Ok(()) => tracing::info!("Logging initialized at level: {}", config.level),
        Err(e) => tracing::debug!("Logging already initialized: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert!(!config.json);
    }

    #[test]
    fn test_from_logging_section() {
        let section = LoggingConfig {
            level: "trace".to_string(),
            json: true,
        };
        let config = LogConfig::from(&section);
        assert_eq!(config.level, "trace");
        assert!(config.json);
    }

    #[test]
    fn test_double_init_is_harmless() {
        init_logging(LogConfig::default());
        init_logging(LogConfig::default());
    }
}
