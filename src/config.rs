//! Configuration types for quotecast

use crate::quote::Currency;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub quotes: QuotesConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Quote cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QuotesConfig {
    /// Currency used when snapshotting every known instrument
    #[serde(default)]
    pub default_currency: Currency,

    /// Upper bound on tracked (instrument, currency) keys
    #[serde(default = "default_max_tracked")]
    pub max_tracked: usize,

    /// Cadence of the synthetic demo ticker (milliseconds)
    #[serde(default = "default_demo_tick_interval_ms")]
    pub demo_tick_interval_ms: u64,
}

fn default_max_tracked() -> usize {
    10_000
}
fn default_demo_tick_interval_ms() -> u64 {
    2000
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            default_currency: Currency::Usd,
            max_tracked: 10_000,
            demo_tick_interval_ms: 2000,
        }
    }
}

impl QuotesConfig {
    /// Demo ticker cadence as a duration
    pub fn demo_tick_interval(&self) -> Duration {
        Duration::from_millis(self.demo_tick_interval_ms)
    }
}

/// Snapshot scheduler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    /// Snapshot bucket width in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    3600
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
        }
    }
}

impl SnapshotConfig {
    /// Snapshot interval as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Port for the Prometheus metrics exporter
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Log filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_metrics_port() -> u16 {
    9090
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: 9090,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [quotes]
            default_currency = "EUR"
            max_tracked = 500
            demo_tick_interval_ms = 250

            [snapshot]
            interval_secs = 900

            [telemetry]
            metrics_port = 9191
            log_level = "debug"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.quotes.default_currency, Currency::Eur);
        assert_eq!(config.quotes.max_tracked, 500);
        assert_eq!(config.snapshot.interval(), Duration::from_secs(900));
        assert_eq!(config.telemetry.metrics_port, 9191);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.quotes.default_currency, Currency::Usd);
        assert_eq!(config.quotes.max_tracked, 10_000);
        assert_eq!(config.snapshot.interval(), Duration::from_secs(3600));
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let toml = r#"
            [snapshot]
            interval_secs = 60
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.snapshot.interval_secs, 60);
        assert_eq!(
            config.quotes.demo_tick_interval(),
            Duration::from_millis(2000)
        );
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }
}
