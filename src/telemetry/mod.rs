//! Logging setup
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a
//! console layer, compact for humans or JSON for log shippers.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Enable JSON logging format
    pub json_format: bool,
    /// Log level filter, in `EnvFilter` syntax
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json_format: false,
            log_level: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self {
            json_format: std::env::var("LOG_JSON")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            log_level: std::env::var("LOG_LEVEL")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),
        }
    }
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);
        subscriber
            .with(fmt_layer)
            .try_init()
            .context("error installing tracing subscriber")?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .compact();
        subscriber
            .with(fmt_layer)
            .try_init()
            .context("error installing tracing subscriber")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.json_format);
    }

    #[test]
    fn test_second_init_fails() {
        let config = TelemetryConfig {
            json_format: true,
            log_level: "debug".to_string(),
        };
        // Whichever call runs first in this process wins.
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
