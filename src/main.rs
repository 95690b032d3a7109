//! VayuLink - network telemetry link daemon for flight simulators
//!
//! Listens on a TCP or UDP port for a simulator's binary telemetry feed,
//! decodes each frame into the shared navigation state, and reports link
//! health until stopped.

use std::env;
use std::path::Path;
use vayu_link::app::App;
use vayu_link::{AppConfig, Result};

const DEFAULT_CONFIG_PATH: &str = "/etc/vayulink.toml";

/// Parse config path from command line arguments.
///
/// Supports:
/// - `vayu-linkd <path>` (positional)
/// - `vayu-linkd --config <path>` (flag-based)
/// - `vayu-linkd -c <path>` (short flag)
///
/// Returns `None` when no path was given.
fn parse_config_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return Some(args[1].clone());
    }

    None
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("VayuLink v{} starting...", env!("CARGO_PKG_VERSION"));

    // An explicit config path must exist; the default path may be absent,
    // in which case the stock Silent Wings feed configuration applies.
    let config = match parse_config_path() {
        Some(path) => {
            log::info!("Using config: {}", path);
            AppConfig::from_file(&path)?
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            log::info!("Using config: {}", DEFAULT_CONFIG_PATH);
            AppConfig::from_file(DEFAULT_CONFIG_PATH)?
        }
        None => {
            log::info!("No config file, using defaults");
            AppConfig::default()
        }
    };

    log::info!(
        "Link: {} port {} ({})",
        config.link.transport,
        config.link.port,
        config.link.driver
    );

    let mut app = App::new(config)?;
    app.run()
}
