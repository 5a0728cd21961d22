//! Default values and validation limits shared across the crate.

use crate::core::activation::ActivationMode;

// # Curve

/// Brightness emitted when no usable curve is configured.
pub const DEFAULT_BRIGHTNESS: u8 = 125;

/// Reference control points as `(lux, brightness)` pairs.
pub const DEFAULT_POINTS: [(f64, i64); 4] = [(1.0, 1), (100.0, 10), (1000.0, 30), (10000.0, 90)];

pub const MINIMUM_BRIGHTNESS: i64 = 0;
pub const MAXIMUM_BRIGHTNESS: i64 = 255;
pub const MINIMUM_CONTROL_POINTS: usize = 2;

// # Activation

pub const DEFAULT_MODE: ActivationMode = ActivationMode::Always;
pub const DEFAULT_SUSPEND_DELAY: u64 = 2500; // ms
pub const MINIMUM_SUSPEND_DELAY: u64 = 100;
pub const MAXIMUM_SUSPEND_DELAY: u64 = 60_000;

// # Smoothing

pub const DEFAULT_SMOOTHING: &str = "ema";
pub const DEFAULT_TIME_CONSTANT: u64 = 2500; // ms
pub const DEFAULT_WINDOW: u64 = 2500; // ms
pub const MINIMUM_SMOOTHING_PERIOD: u64 = 100;
pub const MAXIMUM_SMOOTHING_PERIOD: u64 = 60_000;

// # Hysteresis

pub const DEFAULT_RELATIVE_THRESHOLD: f64 = 0.15;
pub const DEFAULT_ABSOLUTE_THRESHOLD: f64 = 5.0; // lux
pub const MAXIMUM_ABSOLUTE_THRESHOLD: f64 = 10_000.0;

// # Platform

pub const DEFAULT_SENSOR: &str = "auto";
pub const DEFAULT_BACKLIGHT: &str = "auto";
pub const DEFAULT_POLL_INTERVAL: u64 = 250; // ms
pub const MINIMUM_POLL_INTERVAL: u64 = 50;
pub const MAXIMUM_POLL_INTERVAL: u64 = 10_000;
pub const DEFAULT_ORIENTATION: &str = "portrait";

/// Where the kernel exposes IIO devices (ambient light sensors among them).
pub const IIO_DEVICES_PATH: &str = "/sys/bus/iio/devices";

/// Where the kernel exposes backlight devices.
pub const BACKLIGHT_DEVICES_PATH: &str = "/sys/class/backlight";

/// Longest the core loop blocks before re-checking the running flag.
pub const IDLE_WAKEUP_MS: u64 = 500;

// # Exit codes

pub const EXIT_FAILURE: i32 = 1;

#[cfg(test)]
pub mod test_constants {
    /// Reference curve used throughout the end-to-end tests.
    pub const TEST_REFERENCE_POINTS: [(f64, i64); 4] =
        [(10.0, 30), (100.0, 80), (500.0, 150), (1000.0, 255)];
    pub const TEST_SUSPEND_DELAY: u64 = 2500;
    pub const TEST_TIME_CONSTANT: u64 = 2500;
}
