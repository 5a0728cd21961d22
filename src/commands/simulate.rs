//! `autolight simulate`: replay a timestamped event trace through a fresh engine.
//!
//! Trace files hold one `<t_ms> <event>` per line, for example:
//!
//! ```text
//! # dim room, then the user walks outside
//! 0     unlock
//! 50    lux 40
//! 1000  landscape
//! 3000  lux 12000
//! ```
//!
//! Time runs on a [`SimulatedClock`] that jumps from event to event. Suspend deadlines
//! that fall between two events fire at their exact deadline before the later event is
//! delivered, so a replay is fully deterministic.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::core::{
    EngineUpdate,
    activation::Transition,
    dispatch_event,
    engine::{AlwaysSubscribed, BrightnessEngine, EngineSettings},
    fire_due_timer,
};
use crate::io::backlight::RecordingSink;
use crate::io::events::{Event, parse_trace_line};
use crate::time_source::{Clock, SimulatedClock};

/// Something observable that happened during a replay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceOutcome {
    Emitted { at_ms: i64, brightness: u8 },
    Activated { at_ms: i64 },
    Suspended { at_ms: i64 },
}

/// Result of a replay.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationReport {
    pub outcomes: Vec<TraceOutcome>,
    /// Every value the sink received, in order
    pub applied: Vec<u8>,
    pub last_sensor_value: i64,
    pub last_applied_brightness: u8,
}

/// Parse a whole trace. Timestamps must not decrease.
pub fn parse_trace(content: &str) -> Result<Vec<(i64, Event)>> {
    let mut events: Vec<(i64, Event)> = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let Some((time_ms, event)) =
            parse_trace_line(line).with_context(|| format!("line {}", index + 1))?
        else {
            continue;
        };
        if let Some(&(previous, _)) = events.last()
            && time_ms < previous
        {
            anyhow::bail!(
                "line {}: timestamp {time_ms} is earlier than the previous event ({previous})",
                index + 1
            );
        }
        events.push((time_ms, event));
    }
    Ok(events)
}

/// Run `events` through a new engine started at time 0.
///
/// Reload events are skipped; a shutdown event ends the replay early. Suspend timers
/// still pending after the last event are fired as well.
pub fn replay(
    settings: EngineSettings,
    landscape: bool,
    events: &[(i64, Event)],
    debug_enabled: bool,
) -> SimulationReport {
    let clock = SimulatedClock::new(0);
    let sink = RecordingSink::new();
    let mut engine = BrightnessEngine::new(
        settings,
        landscape,
        Box::new(sink.clone()),
        Box::new(AlwaysSubscribed),
    )
    .with_debug(debug_enabled);

    let mut outcomes = Vec::new();
    record_transition(&mut outcomes, 0, engine.start(clock.now_ms()));

    for &(time_ms, event) in events {
        fire_timers_until(&mut engine, &clock, time_ms, &mut outcomes);
        clock.advance_to(time_ms);

        match dispatch_event(&mut engine, event, clock.now_ms()) {
            EngineUpdate::Emitted(brightness) => outcomes.push(TraceOutcome::Emitted {
                at_ms: time_ms,
                brightness,
            }),
            EngineUpdate::Changed(transition) => {
                record_transition(&mut outcomes, time_ms, transition)
            }
            EngineUpdate::Quiet => {}
            EngineUpdate::NotForEngine => {
                if event == Event::Shutdown {
                    break;
                }
                if debug_enabled {
                    log_debug!("Skipping '{}' at {time_ms}ms", event.describe());
                }
            }
        }
    }
    fire_timers_until(&mut engine, &clock, i64::MAX, &mut outcomes);

    SimulationReport {
        outcomes,
        applied: sink.values(),
        last_sensor_value: engine.last_sensor_value(),
        last_applied_brightness: engine.last_applied_brightness(),
    }
}

fn fire_timers_until(
    engine: &mut BrightnessEngine,
    clock: &SimulatedClock,
    limit_ms: i64,
    outcomes: &mut Vec<TraceOutcome>,
) {
    while let Some(token) = engine.pending_suspend() {
        if token.deadline_ms > limit_ms {
            break;
        }
        clock.advance_to(token.deadline_ms);
        let transition = fire_due_timer(engine, clock.now_ms());
        record_transition(outcomes, token.deadline_ms, transition);
        if transition == Transition::Unchanged {
            break;
        }
    }
}

fn record_transition(outcomes: &mut Vec<TraceOutcome>, at_ms: i64, transition: Transition) {
    match transition {
        Transition::Activated { .. } => outcomes.push(TraceOutcome::Activated { at_ms }),
        Transition::Deactivated => outcomes.push(TraceOutcome::Suspended { at_ms }),
        Transition::Unchanged => {}
    }
}

/// Handle `autolight simulate <trace-file>`.
pub fn handle_simulate_command(trace_path: &str, debug_enabled: bool) -> Result<()> {
    log_version!();

    let config = Config::load()?;
    let content = fs::read_to_string(Path::new(trace_path))
        .with_context(|| format!("Failed to read trace file {trace_path}"))?;
    let events = parse_trace(&content).with_context(|| format!("Invalid trace {trace_path}"))?;

    let settings = EngineSettings::from_config(&config);
    log_block_start!(
        "Replaying {} events (mode: {})",
        events.len(),
        settings.mode
    );

    let report = replay(settings, config.starts_in_landscape(), &events, debug_enabled);

    for outcome in &report.outcomes {
        match outcome {
            TraceOutcome::Emitted { at_ms, brightness } => {
                log_indented!("{at_ms:>8}ms  brightness {brightness}")
            }
            TraceOutcome::Activated { at_ms } => log_indented!("{at_ms:>8}ms  sampling started"),
            TraceOutcome::Suspended { at_ms } => {
                log_indented!("{at_ms:>8}ms  sampling suspended")
            }
        }
    }

    log_block_start!("Result:");
    log_indented!("Brightness updates: {}", report.applied.len());
    log_indented!("Last sensor value: {} lux", report.last_sensor_value);
    log_indented!("Last applied brightness: {}", report.last_applied_brightness);
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("simulate - Replay a timestamped event trace");
    log_block_start!("Usage: autolight simulate <trace-file>");
    log_block_start!("Arguments:");
    log_indented!("<trace-file>  Text file with one '<t_ms> <event>' per line");
    log_block_start!("Events:");
    log_indented!("lux <value>, <value>     Ambient light reading");
    log_indented!("landscape, portrait      Orientation change");
    log_indented!("unlock, screen-on        Apply the next reading immediately");
    log_indented!("screen-off, lock         Prepare an immediate update for the next wake");
    log_indented!("shutdown                 End the replay");
    log_block_start!("Description:");
    log_indented!("Runs the trace through a fresh engine built from the configuration");
    log_indented!("and prints every brightness update and activation change. Suspend");
    log_indented!("timers fire at their exact deadline on a simulated clock.");
    log_block_start!("Examples:");
    log_indented!("autolight simulate ~/traces/commute.txt");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::test_constants::*;
    use crate::common::constants::*;
    use crate::core::activation::ActivationMode;
    use crate::core::curve::ControlCurve;
    use crate::core::smoothing::SmoothingStrategy;

    fn settings(mode: ActivationMode) -> EngineSettings {
        EngineSettings {
            curve: ControlCurve::from_config_pairs(&TEST_REFERENCE_POINTS).unwrap(),
            mode,
            suspend_delay_ms: TEST_SUSPEND_DELAY,
            smoothing: SmoothingStrategy::Exponential {
                time_constant_ms: TEST_TIME_CONSTANT,
            },
            relative_threshold: DEFAULT_RELATIVE_THRESHOLD,
            absolute_threshold: DEFAULT_ABSOLUTE_THRESHOLD,
        }
    }

    #[test]
    fn test_parse_trace_skips_comments() {
        let events = parse_trace("# header\n0 unlock\n\n50 lux 40 # dim\n").unwrap();
        assert_eq!(events, vec![(0, Event::Wake), (50, Event::Light { lux: 40.0 })]);
    }

    #[test]
    fn test_parse_trace_rejects_time_going_backwards() {
        let err = parse_trace("100 lux 5\n50 lux 6\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_trace_reports_line_numbers() {
        let err = parse_trace("0 lux 5\nsoon lux 6\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_replay_fires_timer_between_events() {
        let events = parse_trace("0 lux 100\n10000 lux 1000\n").unwrap();
        let report = replay(
            settings(ActivationMode::ActiveWhileLandscape),
            false,
            &events,
            false,
        );

        assert_eq!(
            report.outcomes,
            vec![
                TraceOutcome::Activated { at_ms: 0 },
                TraceOutcome::Emitted {
                    at_ms: 0,
                    brightness: 80
                },
                TraceOutcome::Suspended {
                    at_ms: TEST_SUSPEND_DELAY as i64
                },
            ]
        );
        assert_eq!(report.applied, vec![80]);
        assert_eq!(report.last_sensor_value, 100);
    }

    #[test]
    fn test_replay_stops_at_shutdown() {
        let events = parse_trace("0 lux 10\n5 shutdown\n10 lux 1000\n").unwrap();
        let report = replay(settings(ActivationMode::Always), false, &events, false);
        assert_eq!(report.applied, vec![30]);
        assert_eq!(report.last_applied_brightness, 30);
    }
}
