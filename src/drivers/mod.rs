//! Telemetry drivers and the driver registry.
//!
//! A [`Driver`] turns raw link bytes into navigation-state updates. The
//! daemon looks drivers up by their config name in [`DRIVERS`] and
//! attaches the result to a port's receive thread.

mod silentwings;

pub use silentwings::{FRAME_SIZE, SilentWingsDriver, SilentWingsFrame};

use crate::error::{Error, Result};
use crate::nav::NavState;

/// A telemetry driver attached to one link.
pub trait Driver: Send {
    /// Handle a chunk of bytes read from the link.
    ///
    /// Fails when the buffer cannot be interpreted; the navigation state
    /// is left untouched in that case.
    fn data_received(&mut self, data: &[u8], state: &mut NavState) -> Result<()>;
}

/// Registry entry describing one driver.
pub struct DriverSpec {
    /// Name used in the config file.
    pub name: &'static str,
    /// Human-readable name for log output.
    pub display_name: &'static str,
    factory: fn() -> Box<dyn Driver>,
}

fn make_silentwings() -> Box<dyn Driver> {
    Box::new(SilentWingsDriver::new())
}

/// All drivers known to the daemon, looked up by config name.
pub const DRIVERS: &[DriverSpec] = &[DriverSpec {
    name: "silentwings",
    display_name: "Silent Wings simulator (binary)",
    factory: make_silentwings,
}];

/// Look up a registry entry by config name.
pub fn find_driver(name: &str) -> Option<&'static DriverSpec> {
    DRIVERS.iter().find(|spec| spec.name == name)
}

/// Instantiate a driver by config name.
pub fn create_driver(name: &str) -> Result<Box<dyn Driver>> {
    find_driver(name)
        .map(|spec| (spec.factory)())
        .ok_or_else(|| Error::UnknownDriver(name.to_string()))
}
