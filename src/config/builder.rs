//! Default configuration file generation.
//!
//! The builder keeps the comments of all settings aligned on one column, so the
//! generated file stays readable when defaults in `constants.rs` change width.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::constants::*;

/// Write a commented default configuration to `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write default config to {}", path.display()))
}

/// Text of the default configuration file.
pub fn default_config_content() -> String {
    let points = DEFAULT_POINTS
        .iter()
        .map(|(lux, brightness)| format!("[{lux}, {brightness}]"))
        .collect::<Vec<_>>()
        .join(", ");

    let content = ConfigBuilder::new()
        .add_section("Activation")
        .add_setting(
            "mode",
            &format!("\"{}\"", DEFAULT_MODE.as_str()),
            "When to sample: \"always\", \"portrait\", \"landscape\", \"unlock\"",
        )
        .add_setting(
            "suspend_delay",
            &DEFAULT_SUSPEND_DELAY.to_string(),
            &format!(
                "Grace period before sampling stops ({MINIMUM_SUSPEND_DELAY}-{MAXIMUM_SUSPEND_DELAY})ms"
            ),
        )
        .add_section("Brightness curve")
        .add_setting(
            "points",
            &format!("[{points}]"),
            "[lux, brightness 0-255] pairs, lux strictly increasing",
        )
        .add_section("Smoothing")
        .add_setting(
            "smoothing",
            &format!("\"{DEFAULT_SMOOTHING}\""),
            "\"ema\" (time-decayed average) or \"window\" (moving mean)",
        )
        .add_setting(
            "time_constant",
            &DEFAULT_TIME_CONSTANT.to_string(),
            &format!(
                "EMA time constant ({MINIMUM_SMOOTHING_PERIOD}-{MAXIMUM_SMOOTHING_PERIOD})ms"
            ),
        )
        .add_setting(
            "window",
            &DEFAULT_WINDOW.to_string(),
            &format!(
                "Moving window length ({MINIMUM_SMOOTHING_PERIOD}-{MAXIMUM_SMOOTHING_PERIOD})ms"
            ),
        )
        .add_section("Hysteresis")
        .add_setting(
            "relative_threshold",
            &DEFAULT_RELATIVE_THRESHOLD.to_string(),
            "Minimum relative lux change to react to (0.0-1.0)",
        )
        .add_setting(
            "absolute_threshold",
            &format!("{DEFAULT_ABSOLUTE_THRESHOLD:.1}"),
            &format!("Minimum absolute lux change to react to (0-{MAXIMUM_ABSOLUTE_THRESHOLD})"),
        )
        .add_section("Devices")
        .add_setting(
            "sensor",
            &format!("\"{DEFAULT_SENSOR}\""),
            "\"auto\", \"stdin\", or an IIO device directory",
        )
        .add_setting(
            "poll_interval",
            &DEFAULT_POLL_INTERVAL.to_string(),
            &format!(
                "Sensor polling interval ({MINIMUM_POLL_INTERVAL}-{MAXIMUM_POLL_INTERVAL})ms"
            ),
        )
        .add_setting(
            "backlight",
            &format!("\"{DEFAULT_BACKLIGHT}\""),
            "\"auto\", \"none\", or a /sys/class/backlight device",
        )
        .add_setting(
            "initial_orientation",
            &format!("\"{DEFAULT_ORIENTATION}\""),
            "Orientation assumed until the first event: \"portrait\" or \"landscape\"",
        )
        .build();

    format!("{content}\n")
}

/// Builder for configuration files with aligned comments.
struct ConfigBuilder {
    entries: Vec<Entry>,
}

enum Entry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(Entry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(Entry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        // One space between the widest setting and its comment
        let column = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Setting { line, .. } => Some(line.chars().count()),
                Entry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut lines = Vec::new();
        for entry in self.entries {
            match entry {
                Entry::Section(header) => {
                    if !lines.is_empty() {
                        lines.push(String::new());
                    }
                    lines.push(header);
                }
                Entry::Setting { line, comment } => {
                    let padding = " ".repeat(column - line.chars().count());
                    lines.push(format!("{line}{padding}{comment}"));
                }
            }
        }
        lines.join("\n")
    }
}
