//! Brightness sinks.
//!
//! The engine emits brightness on a 0-255 scale. [`BacklightSink`] maps that onto a
//! sysfs backlight device; [`LogSink`] only reports the value; [`RecordingSink`] keeps
//! every value for inspection.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::common::{
    constants::{BACKLIGHT_DEVICES_PATH, MAXIMUM_BRIGHTNESS},
    utils,
};
use crate::core::engine::BrightnessSink;

/// A `/sys/class/backlight/*` device.
#[derive(Debug, Clone, PartialEq)]
pub struct BacklightSink {
    device: PathBuf,
    max_brightness: u64,
}

impl BacklightSink {
    pub fn open(device: &Path) -> Result<Self> {
        let max_path = device.join("max_brightness");
        let max_brightness = fs::read_to_string(&max_path)
            .with_context(|| format!("Failed to read {}", utils::private_path(&max_path)))?
            .trim()
            .parse::<u64>()
            .with_context(|| format!("Invalid max_brightness in {}", device.display()))?;

        if max_brightness == 0 {
            anyhow::bail!("{} reports max_brightness 0", device.display());
        }

        Ok(Self {
            device: device.to_path_buf(),
            max_brightness,
        })
    }

    /// Open the first backlight device in sorted order.
    pub fn discover() -> Result<Self> {
        Self::discover_in(Path::new(BACKLIGHT_DEVICES_PATH))
    }

    pub fn discover_in(root: &Path) -> Result<Self> {
        let mut devices: Vec<PathBuf> = fs::read_dir(root)
            .with_context(|| format!("Failed to list backlight devices in {}", root.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        devices.sort();

        devices
            .iter()
            .find_map(|device| Self::open(device).ok())
            .with_context(|| format!("No backlight device found in {}", root.display()))
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    pub fn max_brightness(&self) -> u64 {
        self.max_brightness
    }

    /// Device units for a 0-255 brightness.
    pub fn scale(&self, brightness: u8) -> u64 {
        let fraction = f64::from(brightness) / MAXIMUM_BRIGHTNESS as f64;
        (fraction * self.max_brightness as f64).round() as u64
    }

    fn current_raw(&self) -> Option<u64> {
        fs::read_to_string(self.device.join("brightness"))
            .ok()
            .and_then(|content| content.trim().parse::<u64>().ok())
    }
}

impl BrightnessSink for BacklightSink {
    fn apply(&mut self, brightness: u8) -> Result<()> {
        let target = self.scale(brightness);
        if self.current_raw() == Some(target) {
            return Ok(());
        }

        let path = self.device.join("brightness");
        fs::write(&path, target.to_string())
            .with_context(|| format!("Failed to write {}", utils::private_path(&path)))
    }
}

/// Reports each target brightness instead of applying it.
#[derive(Debug, Default)]
pub struct LogSink;

impl BrightnessSink for LogSink {
    fn apply(&mut self, brightness: u8) -> Result<()> {
        log_decorated!("Target brightness: {brightness}");
        Ok(())
    }
}

/// Collects every applied value. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    values: Arc<Mutex<Vec<u8>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<u8> {
        self.values
            .lock()
            .map(|values| values.clone())
            .unwrap_or_default()
    }
}

impl BrightnessSink for RecordingSink {
    fn apply(&mut self, brightness: u8) -> Result<()> {
        self.values
            .lock()
            .map_err(|_| anyhow::anyhow!("recording sink lock poisoned"))?
            .push(brightness);
        Ok(())
    }
}
