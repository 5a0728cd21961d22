//! Change gate between the smoother and the curve.
//!
//! A candidate lux value only passes when it differs from the last *applied* value by
//! more than `max(last * relative_factor, absolute_floor)`. The absolute floor keeps
//! near-dark readings from flickering; the relative factor keeps bright, noisy scenes
//! from producing a stream of tiny updates.

use crate::common::constants::{DEFAULT_ABSOLUTE_THRESHOLD, DEFAULT_RELATIVE_THRESHOLD};

#[derive(Debug, Clone, PartialEq)]
pub struct HysteresisGate {
    relative_factor: f64,
    absolute_floor: f64,
    last_applied: Option<f64>,
}

impl Default for HysteresisGate {
    fn default() -> Self {
        Self::new(DEFAULT_RELATIVE_THRESHOLD, DEFAULT_ABSOLUTE_THRESHOLD)
    }
}

impl HysteresisGate {
    pub fn new(relative_factor: f64, absolute_floor: f64) -> Self {
        Self {
            relative_factor,
            absolute_floor,
            last_applied: None,
        }
    }

    /// Whether `candidate_lux` is far enough from the last applied value to act on.
    pub fn should_apply(&self, candidate_lux: f64) -> bool {
        let Some(last) = self.last_applied else {
            return true;
        };
        let diff = (candidate_lux - last).abs();
        diff > self.threshold_for(last)
    }

    /// Record a value that was actually applied downstream.
    pub fn record(&mut self, lux: f64) {
        self.last_applied = Some(lux);
    }

    /// Forget the last applied value so the next candidate always passes.
    pub fn reset(&mut self) {
        self.last_applied = None;
    }

    pub fn last_applied(&self) -> Option<f64> {
        self.last_applied
    }

    fn threshold_for(&self, last: f64) -> f64 {
        (last * self.relative_factor).max(self.absolute_floor)
    }
}
