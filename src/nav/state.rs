//! Flat navigation-state record.
//!
//! Drivers write into this aggregate and stamp the matching
//! [`Validity`] markers with [`NavState::clock`]; downstream consumers
//! read fields only while their marker is fresh.

use super::Validity;

/// Quality of the position fix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FixQuality {
    /// No position available.
    #[default]
    NoFix,
    /// Live satellite fix.
    Gps,
    /// Differential satellite fix.
    DGps,
    /// Position fed by a simulator, not a receiver.
    Simulation,
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Fix bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct GpsState {
    pub fix_quality: FixQuality,
    pub fix_quality_available: Validity,
    /// True when the fix comes from a real receiver.
    pub real: bool,
    /// True when the fix comes from a simulator feed.
    pub simulator: bool,
}

/// One flat snapshot of where the aircraft is and how fresh each field
/// is.
#[derive(Debug, Clone, Default)]
pub struct NavState {
    /// Monotonic processing clock in seconds. Stamps every validity
    /// update; advanced by the owner before handing the record to a
    /// driver.
    pub clock: f64,

    /// Position in degrees.
    pub location: GeoPoint,
    pub location_available: Validity,

    /// Altitude above mean sea level in meters.
    pub altitude: f64,
    pub altitude_available: Validity,

    /// Ground speed in m/s.
    pub ground_speed: f64,
    pub ground_speed_available: Validity,

    pub gps: GpsState,

    /// Simulator (or GPS) time of day in seconds.
    pub time: f64,
    pub time_available: Validity,

    /// Heartbeat: the link produced data recently.
    pub alive: Validity,
}

impl NavState {
    /// Expire every marker older than `max_age` seconds.
    pub fn expire(&mut self, clock: f64, max_age: f64) {
        self.location_available.expire(clock, max_age);
        self.altitude_available.expire(clock, max_age);
        self.ground_speed_available.expire(clock, max_age);
        self.gps.fix_quality_available.expire(clock, max_age);
        self.time_available.expire(clock, max_age);
        self.alive.expire(clock, max_age);
    }
}
