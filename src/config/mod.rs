//! Configuration system for autolight.
//!
//! Settings live in `autolight.toml`, located in `$XDG_CONFIG_HOME/autolight/` unless a
//! custom directory is given with `--config`. A commented default file is written on
//! first run.
//!
//! ```toml
//! #[Activation]
//! mode = "always"              # When to sample: "always", "portrait", "landscape", "unlock"
//! suspend_delay = 2500         # Grace period before sampling stops (100-60000)ms
//!
//! #[Brightness curve]
//! points = [[1, 1], [100, 10], [1000, 30], [10000, 90]] # [lux, brightness 0-255] pairs
//!
//! #[Smoothing]
//! smoothing = "ema"            # "ema" (time-decayed average) or "window" (moving mean)
//! time_constant = 2500         # EMA time constant (100-60000)ms
//! window = 2500                # Moving window length (100-60000)ms
//!
//! #[Hysteresis]
//! relative_threshold = 0.15    # Minimum relative lux change to react to (0.0-1.0)
//! absolute_threshold = 5.0     # Minimum absolute lux change to react to (0-10000)
//!
//! #[Devices]
//! sensor = "auto"              # "auto", "stdin", or an IIO device directory
//! poll_interval = 250          # Sensor polling interval (50-10000)ms
//! backlight = "auto"           # "auto", "none", or a /sys/class/backlight device
//! initial_orientation = "portrait"
//! ```
//!
//! ## Validation
//!
//! Out-of-range values fail loading with a descriptive error: at startup autolight exits,
//! on hot reload the previous configuration stays active. The brightness curve is the one
//! exception: unusable control points only produce a warning and the engine falls back
//! to a constant safe brightness.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

use serde::Deserialize;

use crate::common::constants::*;
use crate::core::activation::ActivationMode;
use crate::core::smoothing::SmoothingStrategy;

// Re-export public API
pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};
pub use watcher::start_config_watcher;

/// Where ambient light readings come from.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorSource {
    /// First IIO device with an illuminance channel
    Auto,
    /// Events typed or piped on standard input
    Stdin,
    /// A specific IIO device directory
    Device(std::path::PathBuf),
}

/// Where target brightness values go.
#[derive(Debug, Clone, PartialEq)]
pub enum BacklightTarget {
    /// First device under /sys/class/backlight
    Auto,
    /// Log the values only
    None,
    /// A specific backlight device directory
    Device(std::path::PathBuf),
}

/// autolight settings as read from `autolight.toml`.
///
/// Every field is optional; missing values resolve to the defaults in
/// `common::constants`.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    /// Activation policy
    pub mode: Option<ActivationMode>,
    /// Auto-suspend grace period in milliseconds
    pub suspend_delay: Option<u64>,
    /// Brightness curve as `[lux, brightness]` pairs
    pub points: Option<Vec<(f64, i64)>>,

    pub smoothing: Option<String>, // "ema" or "window"
    pub time_constant: Option<u64>, // ms, EMA
    pub window: Option<u64>,       // ms, moving mean

    pub relative_threshold: Option<f64>,
    pub absolute_threshold: Option<f64>, // lux

    pub sensor: Option<String>,
    pub poll_interval: Option<u64>, // ms
    pub backlight: Option<String>,
    pub initial_orientation: Option<String>, // "portrait" or "landscape"
}

impl Config {
    /// Load configuration using the module's load function
    pub fn load() -> anyhow::Result<Self> {
        load()
    }

    pub fn sensor_source(&self) -> SensorSource {
        match self.sensor.as_deref().unwrap_or(DEFAULT_SENSOR) {
            "auto" => SensorSource::Auto,
            "stdin" => SensorSource::Stdin,
            path => SensorSource::Device(path.into()),
        }
    }

    pub fn backlight_target(&self) -> BacklightTarget {
        match self.backlight.as_deref().unwrap_or(DEFAULT_BACKLIGHT) {
            "auto" => BacklightTarget::Auto,
            "none" => BacklightTarget::None,
            path => BacklightTarget::Device(path.into()),
        }
    }

    pub fn starts_in_landscape(&self) -> bool {
        self.initial_orientation.as_deref().unwrap_or(DEFAULT_ORIENTATION) == "landscape"
    }

    /// Whether applying `other` needs a restart (device settings are not hot-swappable).
    pub fn devices_differ(&self, other: &Config) -> bool {
        self.sensor_source() != other.sensor_source()
            || self.backlight_target() != other.backlight_target()
            || self.poll_interval != other.poll_interval
    }

    /// Configured smoothing strategy. Unknown names (rejected by validation) resolve to
    /// the default EMA.
    pub fn smoothing_strategy(&self) -> SmoothingStrategy {
        SmoothingStrategy::parse(
            self.smoothing.as_deref().unwrap_or(DEFAULT_SMOOTHING),
            self.time_constant.unwrap_or(DEFAULT_TIME_CONSTANT),
            self.window.unwrap_or(DEFAULT_WINDOW),
        )
        .unwrap_or(SmoothingStrategy::Exponential {
            time_constant_ms: DEFAULT_TIME_CONSTANT,
        })
    }

    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");

        let mode = self.mode.unwrap_or(DEFAULT_MODE);
        match mode {
            ActivationMode::Always => log_indented!("Mode: Always"),
            ActivationMode::ActiveWhilePortrait => log_indented!("Mode: While portrait"),
            ActivationMode::ActiveWhileLandscape => log_indented!("Mode: While landscape"),
            ActivationMode::OnUnlockOnce => log_indented!("Mode: Once per unlock"),
        }
        if mode != ActivationMode::Always {
            log_indented!(
                "Suspend delay: {}",
                crate::common::utils::format_millis(
                    self.suspend_delay.unwrap_or(DEFAULT_SUSPEND_DELAY)
                )
            );
        }

        let points = self.points.as_deref().unwrap_or(&DEFAULT_POINTS);
        let curve = points
            .iter()
            .map(|(lux, brightness)| format!("{lux}→{brightness}"))
            .collect::<Vec<_>>()
            .join(", ");
        log_indented!("Curve: {curve}");

        let smoothing = self.smoothing_strategy();
        log_indented!(
            "Smoothing: {} ({})",
            smoothing.name(),
            crate::common::utils::format_millis(smoothing.period_ms())
        );
        log_indented!(
            "Hysteresis: {}% or {} lux",
            self.relative_threshold.unwrap_or(DEFAULT_RELATIVE_THRESHOLD) * 100.0,
            self.absolute_threshold.unwrap_or(DEFAULT_ABSOLUTE_THRESHOLD)
        );

        match self.sensor_source() {
            SensorSource::Auto => log_indented!("Sensor: auto"),
            SensorSource::Stdin => log_indented!("Sensor: standard input"),
            SensorSource::Device(path) => {
                log_indented!("Sensor: {}", crate::common::utils::private_path(&path))
            }
        }
        match self.backlight_target() {
            BacklightTarget::Auto => log_indented!("Backlight: auto"),
            BacklightTarget::None => log_indented!("Backlight: none (log only)"),
            BacklightTarget::Device(path) => {
                log_indented!("Backlight: {}", crate::common::utils::private_path(&path))
            }
        }
    }
}
