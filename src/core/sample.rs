//! Raw ambient light readings.

/// A single ambient light reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Monotonic timestamp in milliseconds
    pub timestamp_ms: i64,
    /// Illuminance in lux
    pub lux: f64,
}

impl Sample {
    pub fn new(timestamp_ms: i64, lux: f64) -> Self {
        Self { timestamp_ms, lux }
    }

    /// Negative and non-finite readings are sensor glitches and never enter the engine.
    pub fn is_valid(&self) -> bool {
        self.lux.is_finite() && self.lux >= 0.0
    }
}
