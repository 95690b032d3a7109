//! Navigation state populated by telemetry drivers

mod state;
mod validity;

pub use state::{FixQuality, GeoPoint, GpsState, NavState};
pub use validity::Validity;
