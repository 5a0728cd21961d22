//! `autolight curve`: evaluate the configured brightness curve.
//!
//! Handy for tuning control points without a sensor: every lux value on the command
//! line is mapped through exactly the curve the daemon would use. When standard output
//! is not a terminal the decorated log is switched off and plain `lux<TAB>brightness`
//! lines are printed instead, so the output can be piped into plotting tools.

use anyhow::Result;
use std::io::IsTerminal;

use crate::common::{constants::*, logger::Log};
use crate::config::Config;
use crate::core::{curve::ControlCurve, engine::resolve_curve};

/// Map each lux value through `curve`.
pub fn evaluate(curve: &ControlCurve, lux_values: &[f64]) -> Vec<(f64, u8)> {
    lux_values
        .iter()
        .map(|&lux| (lux, curve.interpolate(lux)))
        .collect()
}

/// Tab-separated rows for piped output.
pub fn format_plain(results: &[(f64, u8)]) -> String {
    results
        .iter()
        .map(|(lux, brightness)| format!("{lux}\t{brightness}\n"))
        .collect()
}

/// Handle `autolight curve <lux>...`.
pub fn handle_curve_command(lux_values: &[f64]) -> Result<()> {
    if !std::io::stdout().is_terminal() {
        return print_plain(lux_values);
    }

    log_version!();

    let config = Config::load()?;
    let (curve, error) = resolve_curve(&config);

    if let Some(e) = error {
        log_pipe!();
        log_warning!("Invalid brightness curve: {e}");
        log_indented!("The daemon would use constant brightness {DEFAULT_BRIGHTNESS}");
    } else {
        let knots = curve
            .points()
            .iter()
            .map(|point| format!("{}→{}", point.lux, point.brightness))
            .collect::<Vec<_>>()
            .join(", ");
        log_block_start!("Curve: {knots}");
    }

    log_block_start!("Brightness:");
    for (lux, brightness) in evaluate(&curve, lux_values) {
        log_indented!("{lux:>10} lux → {brightness:>3}");
    }
    log_end!();
    Ok(())
}

fn print_plain(lux_values: &[f64]) -> Result<()> {
    Log::set_enabled(false);
    let loaded = Config::load();
    // Load failures are reported through the regular error block
    Log::set_enabled(true);
    let config = loaded?;

    let (curve, error) = resolve_curve(&config);
    if let Some(e) = error {
        eprintln!("autolight: invalid brightness curve, using constant {DEFAULT_BRIGHTNESS}: {e}");
    }
    print!("{}", format_plain(&evaluate(&curve, lux_values)));
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("curve - Print the configured brightness for lux values");
    log_block_start!("Usage: autolight curve <lux> [<lux>...]");
    log_block_start!("Arguments:");
    log_indented!("<lux>  Ambient light level, any number of values");
    log_block_start!("Description:");
    log_indented!("Loads the configuration and maps each value through the brightness");
    log_indented!("curve. Values outside the control points clamp to the end points.");
    log_indented!("An unusable curve is reported together with the fallback brightness.");
    log_block_start!("Examples:");
    log_indented!("# Check a dim room and direct sunlight");
    log_indented!("autolight curve 40 20000");
    log_pipe!();
    log_indented!("# Try a different configuration directory");
    log_indented!("autolight --config ~/tuning curve 1 10 100 1000");
    log_end!();
}
