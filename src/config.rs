//! Configuration for the VayuLink daemon
//!
//! Loads configuration from a TOML file: which transport and port to
//! listen on, which telemetry driver to attach, and how the staleness
//! monitor reports.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub link: LinkConfig,
    pub monitor: MonitorConfig,
    pub logging: LoggingConfig,
}

/// Instrument link configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkConfig {
    /// Transport kind: "udp" or "tcp"
    pub transport: String,
    /// Port number to listen on
    pub port: u16,
    /// Driver name from the registry (e.g. "silentwings")
    pub driver: String,
}

/// Staleness monitor configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// Seconds without telemetry before a field is reported stale
    pub stale_after_secs: f64,
    /// Seconds between status log lines
    pub report_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Default configuration: the Silent Wings UDP feed on its stock
    /// output port.
    pub fn silentwings_defaults() -> Self {
        Self {
            link: LinkConfig {
                transport: "udp".to_string(),
                port: 6999,
                driver: "silentwings".to_string(),
            },
            monitor: MonitorConfig {
                stale_after_secs: 5.0,
                report_interval_secs: 10,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::silentwings_defaults()
    }
}
