//! Application orchestration for the VayuLink daemon
//!
//! Wires a configured transport to a telemetry driver, runs the staleness
//! monitor, and handles graceful shutdown on SIGINT/SIGTERM.

use crate::config::AppConfig;
use crate::drivers::{self, Driver};
use crate::error::{Error, Result};
use crate::nav::NavState;
use crate::port::{DataHandler, Port, TcpPort, UdpPort};
use log::{info, warn};
use parking_lot::Mutex;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Glue between a port's receive thread and a telemetry driver.
///
/// Advances the navigation clock on every chunk, then lets the driver
/// stamp its updates against it. Rejected chunks are logged and dropped;
/// the feed keeps running.
struct DriverBridge {
    driver: Mutex<Box<dyn Driver>>,
    state: Arc<Mutex<NavState>>,
    started: Instant,
}

impl DataHandler for DriverBridge {
    fn data_received(&self, data: &[u8]) {
        let mut state = self.state.lock();
        state.clock = self.started.elapsed().as_secs_f64();

        if let Err(e) = self.driver.lock().data_received(data, &mut state) {
            warn!("Driver rejected {} bytes: {}", data.len(), e);
        }
    }
}

/// Main application structure
pub struct App {
    config: AppConfig,
    port: Box<dyn Port>,
    state: Arc<Mutex<NavState>>,
    started: Instant,
    shutdown: Arc<AtomicBool>,
}

impl App {
    /// Create the daemon: instantiate the driver, open the configured
    /// port, and attach the receive handler.
    pub fn new(config: AppConfig) -> Result<Self> {
        let spec = drivers::find_driver(&config.link.driver)
            .ok_or_else(|| Error::UnknownDriver(config.link.driver.clone()))?;
        info!("Driver: {}", spec.display_name);

        let driver = drivers::create_driver(&config.link.driver)?;
        let state = Arc::new(Mutex::new(NavState::default()));
        let started = Instant::now();

        let handler: Arc<dyn DataHandler> = Arc::new(DriverBridge {
            driver: Mutex::new(driver),
            state: Arc::clone(&state),
            started,
        });

        let mut port: Box<dyn Port> = match config.link.transport.as_str() {
            "tcp" => Box::new(TcpPort::new(handler)),
            "udp" => Box::new(UdpPort::new(handler)),
            other => return Err(Error::UnknownTransport(other.to_string())),
        };
        port.open(config.link.port)?;

        Ok(Self {
            config,
            port,
            state,
            started,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Shared navigation state, for embedding the daemon in a larger
    /// application.
    pub fn nav_state(&self) -> Arc<Mutex<NavState>> {
        Arc::clone(&self.state)
    }

    /// Start the receive thread and block until a shutdown signal.
    pub fn run(&mut self) -> Result<()> {
        self.port.start_rx_thread()?;
        self.setup_signal_handler();

        info!("Link up. Press Ctrl+C to stop.");

        let report_interval = Duration::from_secs(self.config.monitor.report_interval_secs.max(1));
        let mut last_report = Instant::now();

        while !self.shutdown.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_millis(100));

            if last_report.elapsed() >= report_interval {
                self.report_status();
                last_report = Instant::now();
            }
        }

        info!("Shutdown signal received, stopping link...");
        self.port.stop_rx_thread()?;
        self.port.close();
        info!("VayuLink stopped");
        Ok(())
    }

    /// Log one status line and expire stale markers.
    fn report_status(&self) {
        let clock = self.started.elapsed().as_secs_f64();
        let stale_after = self.config.monitor.stale_after_secs;

        let mut state = self.state.lock();
        let age = state.alive.age(clock);
        state.expire(clock, stale_after);

        match age {
            None => info!("Waiting for telemetry..."),
            Some(age) if age > stale_after => {
                warn!("Telemetry stale - {:.1}s since last frame", age);
            }
            Some(age) => info!(
                "Telemetry alive: lat={:.5} lon={:.5} alt={:.1}m gs={:.1}m/s (age {:.1}s)",
                state.location.latitude,
                state.location.longitude,
                state.altitude,
                state.ground_speed,
                age
            ),
        }
    }

    /// Setup signal handler for graceful shutdown
    fn setup_signal_handler(&self) {
        let shutdown = Arc::clone(&self.shutdown);

        thread::Builder::new()
            .name("signal-handler".to_string())
            .spawn(move || {
                let mut signals =
                    Signals::new([SIGINT, SIGTERM]).expect("Failed to register signal handlers");

                if let Some(sig) = signals.forever().next() {
                    info!("Received signal {:?}, initiating shutdown...", sig);
                    shutdown.store(true, Ordering::Relaxed);
                }
            })
            .expect("Failed to spawn signal handler thread");
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.port.close();
    }
}
