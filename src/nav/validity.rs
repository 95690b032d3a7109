//! Freshness markers for navigation-state fields.
//!
//! A [`Validity`] records when a field was last written, in processing
//! clock seconds. Producers stamp it on every update; consumers compare
//! the stamp against their own clock to detect staleness. The marker
//! never interprets freshness itself beyond the explicit
//! [`expire`](Validity::expire) call.

/// Timestamped availability marker for one navigation-state field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Validity {
    updated: Option<f64>,
}

impl Validity {
    /// Stamp the marker with the current processing clock.
    pub fn update(&mut self, clock: f64) {
        self.updated = Some(clock);
    }

    /// Forget the field entirely.
    pub fn clear(&mut self) {
        self.updated = None;
    }

    /// True while the field has ever been written and not expired.
    pub fn is_valid(&self) -> bool {
        self.updated.is_some()
    }

    /// Clock value of the last update.
    pub fn updated_at(&self) -> Option<f64> {
        self.updated
    }

    /// Seconds since the last update, if any.
    pub fn age(&self, clock: f64) -> Option<f64> {
        self.updated.map(|at| clock - at)
    }

    /// Invalidate the marker once it is older than `max_age` seconds.
    /// Returns whether the field is still valid.
    pub fn expire(&mut self, clock: f64, max_age: f64) -> bool {
        if let Some(at) = self.updated
            && clock - at > max_age
        {
            self.updated = None;
        }
        self.is_valid()
    }
}
