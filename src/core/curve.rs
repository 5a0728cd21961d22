//! Brightness curve built from user-defined control points.
//!
//! The curve maps ambient illuminance to a target brightness by interpolating between
//! adjacent control points in `log10(lux + 1)` space. Eyes perceive light roughly
//! logarithmically, so equal steps in log-lux feel like equal steps in brightness.
//! Outside the configured range the first and last brightnesses act as hard floor and
//! ceiling; the curve never extrapolates.

use anyhow::Result;

use crate::common::constants::*;

/// One knot of the brightness curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    /// Ambient illuminance at which `brightness` applies
    pub lux: f64,
    /// Target brightness at `lux`
    pub brightness: u8,
}

impl ControlPoint {
    pub fn new(lux: f64, brightness: u8) -> Self {
        Self { lux, brightness }
    }

    /// Build a point from raw configuration values, rejecting out-of-range input.
    pub fn from_config(lux: f64, brightness: i64) -> Result<Self> {
        if !lux.is_finite() || lux < 0.0 {
            anyhow::bail!("control point lux ({lux}) must be a finite value >= 0");
        }
        if !(MINIMUM_BRIGHTNESS..=MAXIMUM_BRIGHTNESS).contains(&brightness) {
            anyhow::bail!(
                "control point brightness ({}) must be between {} and {}",
                brightness,
                MINIMUM_BRIGHTNESS,
                MAXIMUM_BRIGHTNESS
            );
        }
        Ok(Self::new(lux, brightness as u8))
    }
}

/// Immutable, sorted set of control points.
///
/// A curve is replaced wholesale on reconfiguration and never mutated in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControlCurve {
    points: Vec<ControlPoint>,
}

impl ControlCurve {
    /// Sort the points by lux without any further checks.
    ///
    /// Degenerate input (fewer than two points, duplicate thresholds) is accepted and
    /// handled by [`ControlCurve::interpolate`].
    pub fn from_points(mut points: Vec<ControlPoint>) -> Self {
        points.sort_by(|a, b| a.lux.total_cmp(&b.lux));
        Self { points }
    }

    /// Build a curve that satisfies the configuration invariants.
    ///
    /// Requires at least two points and strictly increasing thresholds once sorted.
    pub fn validated(points: Vec<ControlPoint>) -> Result<Self> {
        if points.len() < MINIMUM_CONTROL_POINTS {
            anyhow::bail!(
                "brightness curve needs at least {} control points (got {})",
                MINIMUM_CONTROL_POINTS,
                points.len()
            );
        }
        if let Some(point) = points.iter().find(|p| !p.lux.is_finite() || p.lux < 0.0) {
            anyhow::bail!("control point lux ({}) must be a finite value >= 0", point.lux);
        }

        let curve = Self::from_points(points);
        if let Some(pair) = curve.points.windows(2).find(|pair| pair[0].lux >= pair[1].lux) {
            anyhow::bail!(
                "control point thresholds must be strictly increasing (duplicate lux {})",
                pair[1].lux
            );
        }
        Ok(curve)
    }

    /// Parse `[lux, brightness]` pairs as they appear in the configuration file.
    pub fn from_config_pairs(pairs: &[(f64, i64)]) -> Result<Self> {
        let points = pairs
            .iter()
            .map(|&(lux, brightness)| ControlPoint::from_config(lux, brightness))
            .collect::<Result<Vec<_>>>()?;
        Self::validated(points)
    }

    /// Curve used when the configured points are unusable: constant safe brightness.
    pub fn fallback() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn is_fallback(&self) -> bool {
        self.points.is_empty()
    }

    /// Map an ambient illuminance to a brightness in `[0, 255]`.
    pub fn interpolate(&self, lux: f64) -> u8 {
        let (first, last) = match self.points.as_slice() {
            [] => return DEFAULT_BRIGHTNESS,
            [only] => return only.brightness,
            [first, .., last] => (first, last),
        };

        if lux <= first.lux {
            return first.brightness;
        }
        if lux >= last.lux {
            return last.brightness;
        }

        // First knot at or above lux; exists because lux < last.lux
        let upper_index = self
            .points
            .iter()
            .position(|p| p.lux >= lux)
            .unwrap_or(self.points.len() - 1);
        let lower = self.points[upper_index.saturating_sub(1)];
        let upper = self.points[upper_index];

        let log_lux = (lux + 1.0).log10();
        let log_lower = (lower.lux + 1.0).log10();
        let log_upper = (upper.lux + 1.0).log10();
        let span = log_upper - log_lower;

        let t = if span == 0.0 {
            0.0
        } else {
            ((log_lux - log_lower) / span).clamp(0.0, 1.0)
        };

        let y1 = f64::from(lower.brightness);
        let y2 = f64::from(upper.brightness);
        let value = (y1 + (y2 - y1) * t).round();
        value.clamp(MINIMUM_BRIGHTNESS as f64, MAXIMUM_BRIGHTNESS as f64) as u8
    }
}
