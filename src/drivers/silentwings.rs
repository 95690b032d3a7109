//! Silent Wings simulator telemetry.
//!
//! The simulator exports one packed binary physics sample per frame
//! (the "UDP Output" feed). The record layout is fixed: a millisecond
//! timestamp, double-precision position, and a run of single-precision
//! fields, with no padding anywhere. Multi-byte values arrive in the
//! host's native byte order, an inherited property of the wire format,
//! which assumes feed and consumer share a platform.
//!
//! A received buffer must be an exact positive multiple of
//! [`FRAME_SIZE`]; anything else is rejected without touching the
//! navigation state. Several frames may arrive coalesced in one buffer
//! and are applied in order, so the last frame wins.

use crate::drivers::Driver;
use crate::error::{Error, Result};
use crate::nav::{FixQuality, GeoPoint, NavState};

/// Size of one encoded frame on the wire:
/// `u32` + 2 × `f64` + 28 × `f32`, packed.
pub const FRAME_SIZE: usize = 132;

/// One decoded physics sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SilentWingsFrame {
    /// Milliseconds since simulation start.
    pub timestamp_ms: u32,
    /// Degrees.
    pub latitude: f64,
    /// Degrees.
    pub longitude: f64,
    /// Meters above sea level.
    pub altitude_msl: f32,
    /// Meters above ground.
    pub altitude_agl: f32,
    /// Ground clearance 45° ahead. Reserved by the format, never filled.
    pub ground_clearance_45: f32,
    /// Ground clearance straight ahead. Reserved by the format, never
    /// filled.
    pub ground_clearance_ahead: f32,
    /// Degrees.
    pub roll: f32,
    /// Degrees.
    pub pitch: f32,
    /// Degrees.
    pub yaw: f32,
    /// Degrees per second.
    pub roll_rate: f32,
    /// Degrees per second.
    pub pitch_rate: f32,
    /// Degrees per second.
    pub yaw_rate: f32,
    /// Body-axis velocity in m/s.
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub velocity_z: f32,
    /// Body-axis velocity relative to the wind, m/s.
    pub wind_velocity_x: f32,
    pub wind_velocity_y: f32,
    pub wind_velocity_z: f32,
    /// Equivalent (indicated) airspeed in m/s.
    pub airspeed_eas: f32,
    /// Body-axis acceleration in m/s².
    pub accel_x: f32,
    pub accel_y: f32,
    pub accel_z: f32,
    /// Degrees.
    pub angle_of_attack: f32,
    /// Degrees.
    pub sideslip: f32,
    /// TE-compensated variometer, m/s.
    pub vario: f32,
    /// Compass heading in degrees.
    pub heading: f32,
    /// Degrees per second.
    pub turn_rate: f32,
    /// Local air pressure at aircraft altitude, Pa.
    pub air_pressure: f32,
    /// Air density at aircraft altitude.
    pub air_density: f32,
    /// Air temperature at aircraft altitude, °C.
    pub air_temperature: f32,
}

impl SilentWingsFrame {
    /// Decode one frame from its exact wire representation.
    pub fn decode(bytes: &[u8; FRAME_SIZE]) -> Self {
        let mut reader = FieldReader {
            bytes: bytes.as_slice(),
        };

        Self {
            timestamp_ms: reader.u32(),
            latitude: reader.f64(),
            longitude: reader.f64(),
            altitude_msl: reader.f32(),
            altitude_agl: reader.f32(),
            ground_clearance_45: reader.f32(),
            ground_clearance_ahead: reader.f32(),
            roll: reader.f32(),
            pitch: reader.f32(),
            yaw: reader.f32(),
            roll_rate: reader.f32(),
            pitch_rate: reader.f32(),
            yaw_rate: reader.f32(),
            velocity_x: reader.f32(),
            velocity_y: reader.f32(),
            velocity_z: reader.f32(),
            wind_velocity_x: reader.f32(),
            wind_velocity_y: reader.f32(),
            wind_velocity_z: reader.f32(),
            airspeed_eas: reader.f32(),
            accel_x: reader.f32(),
            accel_y: reader.f32(),
            accel_z: reader.f32(),
            angle_of_attack: reader.f32(),
            sideslip: reader.f32(),
            vario: reader.f32(),
            heading: reader.f32(),
            turn_rate: reader.f32(),
            air_pressure: reader.f32(),
            air_density: reader.f32(),
            air_temperature: reader.f32(),
        }
    }
}

/// Sequential field reader over a validated frame.
struct FieldReader<'a> {
    bytes: &'a [u8],
}

impl FieldReader<'_> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let (head, rest) = self.bytes.split_at(N);
        self.bytes = rest;
        let mut out = [0u8; N];
        out.copy_from_slice(head);
        out
    }

    fn u32(&mut self) -> u32 {
        u32::from_ne_bytes(self.take())
    }

    fn f32(&mut self) -> f32 {
        f32::from_ne_bytes(self.take())
    }

    fn f64(&mut self) -> f64 {
        f64::from_ne_bytes(self.take())
    }
}

/// Driver for the Silent Wings binary feed.
pub struct SilentWingsDriver {
    frames: u64,
}

impl SilentWingsDriver {
    pub fn new() -> Self {
        Self { frames: 0 }
    }

    /// Number of frames applied so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    fn apply(&mut self, frame: &SilentWingsFrame, state: &mut NavState) {
        let clock = state.clock;

        state.location = GeoPoint {
            latitude: frame.latitude,
            longitude: frame.longitude,
        };
        state.location_available.update(clock);

        state.altitude = f64::from(frame.altitude_msl);
        state.altitude_available.update(clock);

        // magnitude in f64; summing squared f32 drifts across frames
        state.ground_speed = f64::from(frame.velocity_x).hypot(f64::from(frame.velocity_y));
        state.ground_speed_available.update(clock);

        state.gps.fix_quality = FixQuality::Simulation;
        state.gps.real = false;
        state.gps.simulator = true;
        state.gps.fix_quality_available.update(clock);

        // wire timestamp is milliseconds since simulation start
        state.time = f64::from(frame.timestamp_ms) / 1000.0;
        state.time_available.update(clock);

        state.alive.update(clock);

        self.frames += 1;
    }
}

impl Default for SilentWingsDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for SilentWingsDriver {
    fn data_received(&mut self, data: &[u8], state: &mut NavState) -> Result<()> {
        if data.is_empty() || data.len() % FRAME_SIZE != 0 {
            return Err(Error::MalformedPacket(format!(
                "expected a positive multiple of {} bytes, got {}",
                FRAME_SIZE,
                data.len()
            )));
        }

        for chunk in data.chunks_exact(FRAME_SIZE) {
            let mut raw = [0u8; FRAME_SIZE];
            raw.copy_from_slice(chunk);
            let frame = SilentWingsFrame::decode(&raw);
            self.apply(&frame, state);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode a frame the way the simulator lays it out on the wire.
    fn encode(frame: &SilentWingsFrame) -> Vec<u8> {
        let mut out = Vec::with_capacity(FRAME_SIZE);
        out.extend_from_slice(&frame.timestamp_ms.to_ne_bytes());
        out.extend_from_slice(&frame.latitude.to_ne_bytes());
        out.extend_from_slice(&frame.longitude.to_ne_bytes());
        for value in [
            frame.altitude_msl,
            frame.altitude_agl,
            frame.ground_clearance_45,
            frame.ground_clearance_ahead,
            frame.roll,
            frame.pitch,
            frame.yaw,
            frame.roll_rate,
            frame.pitch_rate,
            frame.yaw_rate,
            frame.velocity_x,
            frame.velocity_y,
            frame.velocity_z,
            frame.wind_velocity_x,
            frame.wind_velocity_y,
            frame.wind_velocity_z,
            frame.airspeed_eas,
            frame.accel_x,
            frame.accel_y,
            frame.accel_z,
            frame.angle_of_attack,
            frame.sideslip,
            frame.vario,
            frame.heading,
            frame.turn_rate,
            frame.air_pressure,
            frame.air_density,
            frame.air_temperature,
        ] {
            out.extend_from_slice(&value.to_ne_bytes());
        }
        out
    }

    #[test]
    fn test_frame_size_matches_encoding() {
        let frame = SilentWingsFrame::default();
        assert_eq!(encode(&frame).len(), FRAME_SIZE);
    }

    #[test]
    fn test_decode_round_trips() {
        let frame = SilentWingsFrame {
            timestamp_ms: 123_456,
            latitude: 60.171,
            longitude: 11.049,
            altitude_msl: 850.5,
            velocity_x: -3.0,
            velocity_y: 4.0,
            heading: 271.5,
            air_temperature: -7.25,
            ..Default::default()
        };

        let bytes = encode(&frame);
        let mut raw = [0u8; FRAME_SIZE];
        raw.copy_from_slice(&bytes);

        assert_eq!(SilentWingsFrame::decode(&raw), frame);
    }

    #[test]
    fn test_rejects_non_multiple_lengths() {
        let mut driver = SilentWingsDriver::new();

        for length in [1, 4, FRAME_SIZE - 1, FRAME_SIZE + 1, 2 * FRAME_SIZE - 7] {
            let mut state = NavState::default();
            state.clock = 42.0;

            let data = vec![0u8; length];
            assert!(driver.data_received(&data, &mut state).is_err());

            // no partial interpretation
            assert!(!state.location_available.is_valid());
            assert!(!state.alive.is_valid());
            assert_eq!(state.gps.fix_quality, FixQuality::NoFix);
        }

        assert_eq!(driver.frame_count(), 0);
    }

    #[test]
    fn test_rejects_empty_buffer() {
        let mut driver = SilentWingsDriver::new();
        let mut state = NavState::default();
        assert!(driver.data_received(&[], &mut state).is_err());
    }

    #[test]
    fn test_single_frame_populates_state() {
        let frame = SilentWingsFrame {
            timestamp_ms: 90_000,
            latitude: 60.5,
            longitude: 11.25,
            altitude_msl: 1200.0,
            velocity_x: 3.0,
            velocity_y: 4.0,
            ..Default::default()
        };

        let mut driver = SilentWingsDriver::new();
        let mut state = NavState::default();
        state.clock = 17.5;

        driver.data_received(&encode(&frame), &mut state).unwrap();

        assert_eq!(state.location.latitude, 60.5);
        assert_eq!(state.location.longitude, 11.25);
        assert_eq!(state.altitude, 1200.0);
        assert_eq!(state.ground_speed, 5.0);
        assert_eq!(state.gps.fix_quality, FixQuality::Simulation);
        assert!(!state.gps.real);
        assert!(state.gps.simulator);
        assert_eq!(state.time, 90.0);

        for validity in [
            state.location_available,
            state.altitude_available,
            state.ground_speed_available,
            state.gps.fix_quality_available,
            state.time_available,
            state.alive,
        ] {
            assert_eq!(validity.updated_at(), Some(17.5));
        }

        assert_eq!(driver.frame_count(), 1);
    }

    #[test]
    fn test_coalesced_frames_apply_in_order() {
        let first = SilentWingsFrame {
            timestamp_ms: 1_000,
            latitude: 59.0,
            ..Default::default()
        };
        let second = SilentWingsFrame {
            timestamp_ms: 2_000,
            latitude: 59.1,
            ..Default::default()
        };

        let mut data = encode(&first);
        data.extend_from_slice(&encode(&second));

        let mut driver = SilentWingsDriver::new();
        let mut state = NavState::default();
        driver.data_received(&data, &mut state).unwrap();

        // last frame wins
        assert_eq!(state.time, 2.0);
        assert_eq!(state.location.latitude, 59.1);
        assert_eq!(driver.frame_count(), 2);
    }
}
