//! Configuration validation.
//!
//! Checks value ranges and enumerated strings. The brightness curve is deliberately not
//! validated here: bad control points degrade to the fallback curve with a warning
//! instead of rejecting the whole file.

use anyhow::Result;

use super::Config;
use crate::common::constants::*;
use crate::core::smoothing::SmoothingStrategy;

/// Validate every field that has a fixed range or a fixed set of values.
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(delay) = config.suspend_delay {
        check_range("suspend_delay", delay, MINIMUM_SUSPEND_DELAY, MAXIMUM_SUSPEND_DELAY)?;
    }

    if let Some(time_constant) = config.time_constant {
        check_range(
            "time_constant",
            time_constant,
            MINIMUM_SMOOTHING_PERIOD,
            MAXIMUM_SMOOTHING_PERIOD,
        )?;
    }
    if let Some(window) = config.window {
        check_range(
            "window",
            window,
            MINIMUM_SMOOTHING_PERIOD,
            MAXIMUM_SMOOTHING_PERIOD,
        )?;
    }
    if let Some(smoothing) = config.smoothing.as_deref() {
        SmoothingStrategy::parse(smoothing, DEFAULT_TIME_CONSTANT, DEFAULT_WINDOW)?;
    }

    if let Some(relative) = config.relative_threshold
        && !(relative.is_finite() && (0.0..=1.0).contains(&relative))
    {
        anyhow::bail!("relative_threshold ({relative}) must be between 0.0 and 1.0");
    }
    if let Some(absolute) = config.absolute_threshold
        && !(absolute.is_finite() && (0.0..=MAXIMUM_ABSOLUTE_THRESHOLD).contains(&absolute))
    {
        anyhow::bail!(
            "absolute_threshold ({absolute}) must be between 0 and {MAXIMUM_ABSOLUTE_THRESHOLD}"
        );
    }

    if let Some(interval) = config.poll_interval {
        check_range(
            "poll_interval",
            interval,
            MINIMUM_POLL_INTERVAL,
            MAXIMUM_POLL_INTERVAL,
        )?;
    }

    if let Some(sensor) = config.sensor.as_deref()
        && sensor.trim().is_empty()
    {
        anyhow::bail!("sensor must be \"auto\", \"stdin\" or a device path");
    }
    if let Some(backlight) = config.backlight.as_deref()
        && backlight.trim().is_empty()
    {
        anyhow::bail!("backlight must be \"auto\", \"none\" or a device path");
    }

    if let Some(orientation) = config.initial_orientation.as_deref()
        && !matches!(orientation, "portrait" | "landscape")
    {
        anyhow::bail!(
            "initial_orientation must be \"portrait\" or \"landscape\" (got \"{orientation}\")"
        );
    }

    Ok(())
}

fn check_range(name: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if !(min..=max).contains(&value) {
        anyhow::bail!("{name} ({value}) must be between {min} and {max} milliseconds");
    }
    Ok(())
}
