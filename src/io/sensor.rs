//! Ambient light sources.
//!
//! - [`IioLightSensor`]: the kernel IIO interface under `/sys/bus/iio/devices`. A poller
//!   thread reads the illuminance attribute while the engine holds a subscription.
//! - [`spawn_stdin_source`]: line-oriented events on standard input, for scripting and
//!   for machines without a sensor.

use anyhow::{Context, Result};
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use crate::common::{constants::IIO_DEVICES_PATH, utils};
use crate::core::engine::SensorSubscription;
use crate::io::events::{Event, parse_event};

/// How the illuminance value is exposed by the device.
#[derive(Debug, Clone, PartialEq)]
enum IlluminanceChannel {
    /// `in_illuminance_input`, already in lux
    Processed(PathBuf),
    /// `in_illuminance_raw` with optional scale and offset: `(raw + offset) * scale`
    Raw {
        raw: PathBuf,
        scale: f64,
        offset: f64,
    },
}

/// An IIO ambient light sensor device.
#[derive(Debug, Clone, PartialEq)]
pub struct IioLightSensor {
    device: PathBuf,
    channel: IlluminanceChannel,
}

impl IioLightSensor {
    /// Open a specific IIO device directory.
    pub fn open(device: &Path) -> Result<Self> {
        let input = device.join("in_illuminance_input");
        if input.exists() {
            return Ok(Self {
                device: device.to_path_buf(),
                channel: IlluminanceChannel::Processed(input),
            });
        }

        let raw = device.join("in_illuminance_raw");
        if raw.exists() {
            let scale = read_optional_f64(&device.join("in_illuminance_scale"))?.unwrap_or(1.0);
            let offset = read_optional_f64(&device.join("in_illuminance_offset"))?.unwrap_or(0.0);
            return Ok(Self {
                device: device.to_path_buf(),
                channel: IlluminanceChannel::Raw { raw, scale, offset },
            });
        }

        anyhow::bail!(
            "{} does not expose an illuminance channel",
            utils::private_path(device)
        )
    }

    /// Find the first IIO device with an illuminance channel.
    pub fn discover() -> Result<Self> {
        Self::discover_in(Path::new(IIO_DEVICES_PATH))
    }

    pub fn discover_in(root: &Path) -> Result<Self> {
        let entries = fs::read_dir(root)
            .with_context(|| format!("Failed to list IIO devices in {}", root.display()))?;

        let mut devices: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("iio:device"))
            })
            .collect();
        devices.sort();

        devices
            .iter()
            .find_map(|device| Self::open(device).ok())
            .with_context(|| format!("No ambient light sensor found in {}", root.display()))
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    /// Read the current illuminance in lux.
    pub fn read_lux(&self) -> Result<f64> {
        match &self.channel {
            IlluminanceChannel::Processed(path) => read_f64(path),
            IlluminanceChannel::Raw { raw, scale, offset } => {
                Ok((read_f64(raw)? + offset) * scale)
            }
        }
    }

    /// Start polling in a background thread. Samples are only read and sent while the
    /// returned subscription is started.
    pub fn spawn_poller(
        self,
        sender: Sender<Event>,
        poll_interval: Duration,
        running: Arc<AtomicBool>,
    ) -> IioSubscription {
        let subscribed = Arc::new(AtomicBool::new(false));
        let flag = subscribed.clone();

        thread::spawn(move || {
            let mut read_failing = false;
            while running.load(Ordering::SeqCst) {
                if flag.load(Ordering::SeqCst) {
                    match self.read_lux() {
                        Ok(lux) => {
                            read_failing = false;
                            if sender.send(Event::Light { lux }).is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            // Log once per failure streak, keep retrying
                            if !read_failing {
                                log_pipe!();
                                log_warning!("Failed to read light sensor: {e}");
                                read_failing = true;
                            }
                        }
                    }
                }
                thread::sleep(poll_interval);
            }
        });

        IioSubscription { subscribed }
    }
}

/// Subscription handle controlling an [`IioLightSensor`] poller.
#[derive(Debug)]
pub struct IioSubscription {
    subscribed: Arc<AtomicBool>,
}

impl SensorSubscription for IioSubscription {
    fn start(&mut self) -> Result<()> {
        self.subscribed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.subscribed.store(false, Ordering::SeqCst);
    }
}

fn read_f64(path: &Path) -> Result<f64> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    content
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid number in {}", path.display()))
}

fn read_optional_f64(path: &Path) -> Result<Option<f64>> {
    if !path.exists() {
        return Ok(None);
    }
    read_f64(path).map(Some)
}

/// Read events from standard input until EOF, then request shutdown.
pub fn spawn_stdin_source(sender: Sender<Event>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match parse_event(trimmed) {
                Ok(event) => {
                    if sender.send(event).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    log_pipe!();
                    log_warning!("Ignoring input: {e}");
                }
            }
        }
        let _ = sender.send(Event::Shutdown);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_processed_channel() {
        let dir = tempdir().unwrap();
        let device = dir.path().join("iio:device0");
        fs::create_dir(&device).unwrap();
        write(&device.join("in_illuminance_input"), "231.5\n");

        let sensor = IioLightSensor::open(&device).unwrap();
        assert_eq!(sensor.read_lux().unwrap(), 231.5);
    }

    #[test]
    fn test_raw_channel_applies_scale_and_offset() {
        let dir = tempdir().unwrap();
        let device = dir.path().join("iio:device1");
        fs::create_dir(&device).unwrap();
        write(&device.join("in_illuminance_raw"), "100\n");
        write(&device.join("in_illuminance_scale"), "0.5\n");
        write(&device.join("in_illuminance_offset"), "10\n");

        let sensor = IioLightSensor::open(&device).unwrap();
        assert_eq!(sensor.read_lux().unwrap(), 55.0);
    }

    #[test]
    fn test_discovery_skips_other_devices() {
        let dir = tempdir().unwrap();
        let accel = dir.path().join("iio:device0");
        fs::create_dir(&accel).unwrap();
        write(&accel.join("in_accel_x_raw"), "12\n");

        let light = dir.path().join("iio:device1");
        fs::create_dir(&light).unwrap();
        write(&light.join("in_illuminance_raw"), "40\n");

        let sensor = IioLightSensor::discover_in(dir.path()).unwrap();
        assert_eq!(sensor.device(), light.as_path());
        assert_eq!(sensor.read_lux().unwrap(), 40.0);
    }

    #[test]
    fn test_discovery_without_sensor_fails() {
        let dir = tempdir().unwrap();
        let err = IioLightSensor::discover_in(dir.path()).unwrap_err();
        assert!(err.to_string().contains("No ambient light sensor"));
    }

    #[test]
    fn test_subscription_toggles_flag() {
        let mut subscription = IioSubscription {
            subscribed: Arc::new(AtomicBool::new(false)),
        };
        subscription.start().unwrap();
        assert!(subscription.subscribed.load(Ordering::SeqCst));
        subscription.stop();
        assert!(!subscription.subscribed.load(Ordering::SeqCst));
    }
}
