use autolight::commands::simulate::{TraceOutcome, parse_trace, replay};
use autolight::core::{
    activation::{ActivationMode, ActivationState, Transition},
    curve::ControlCurve,
    engine::{AlwaysSubscribed, BrightnessEngine, EngineSettings},
    sample::Sample,
    smoothing::SmoothingStrategy,
};
use autolight::io::backlight::RecordingSink;

const REFERENCE_POINTS: [(f64, i64); 4] = [(10.0, 30), (100.0, 80), (500.0, 150), (1000.0, 255)];
const SUSPEND_DELAY: u64 = 2500;

fn reference_curve() -> ControlCurve {
    ControlCurve::from_config_pairs(&REFERENCE_POINTS).unwrap()
}

fn settings(mode: ActivationMode) -> EngineSettings {
    EngineSettings {
        curve: reference_curve(),
        mode,
        suspend_delay_ms: SUSPEND_DELAY,
        smoothing: SmoothingStrategy::Exponential {
            time_constant_ms: 2500,
        },
        relative_threshold: 0.15,
        absolute_threshold: 5.0,
    }
}

fn engine_with(settings: EngineSettings, landscape: bool) -> (BrightnessEngine, RecordingSink) {
    let sink = RecordingSink::new();
    let engine = BrightnessEngine::new(
        settings,
        landscape,
        Box::new(sink.clone()),
        Box::new(AlwaysSubscribed),
    );
    (engine, sink)
}

fn engine(mode: ActivationMode, landscape: bool) -> (BrightnessEngine, RecordingSink) {
    engine_with(settings(mode), landscape)
}

#[cfg(test)]
mod reference_scenarios {
    use super::*;

    #[test]
    fn test_log_compression_between_knots() {
        let (mut engine, sink) = engine(ActivationMode::Always, false);
        engine.start(0);

        let brightness = engine.on_raw_sample(Sample::new(0, 300.0)).unwrap();

        // Linear interpolation between (100, 80) and (500, 150) would give 115
        assert!(brightness > 80 && brightness < 150);
        assert!(brightness > 115);
        assert_eq!(brightness, 128);
        assert_eq!(sink.values(), vec![128]);
    }

    #[test]
    fn test_readings_outside_range_clamp() {
        let (mut dim, _) = engine(ActivationMode::Always, false);
        dim.start(0);
        assert_eq!(dim.on_raw_sample(Sample::new(0, 5.0)), Some(30));

        let (mut bright, _) = engine(ActivationMode::Always, false);
        bright.start(0);
        assert_eq!(bright.on_raw_sample(Sample::new(0, 5000.0)), Some(255));
    }

    #[test]
    fn test_unlock_once_applies_immediately_then_stops() {
        let (mut engine, sink) = engine(ActivationMode::OnUnlockOnce, false);
        assert_eq!(engine.state(), ActivationState::Inactive);

        engine.notify_unlock_or_screen_on(0);
        assert!(matches!(engine.state(), ActivationState::Listening { .. }));

        let brightness = engine.on_raw_sample(Sample::new(10, 200.0));
        assert_eq!(brightness, Some(reference_curve().interpolate(200.0)));
        assert_eq!(engine.state(), ActivationState::Inactive);
        assert_eq!(engine.pending_suspend(), None);

        // Further readings are ignored until the next unlock
        assert_eq!(engine.on_raw_sample(Sample::new(20, 900.0)), None);
        assert_eq!(sink.values().len(), 1);
    }

    #[test]
    fn test_portrait_suspends_after_grace_period() {
        let (mut engine, _) = engine(ActivationMode::ActiveWhileLandscape, false);
        engine.start(0);

        let token = engine.pending_suspend().unwrap();
        assert_eq!(token.deadline_ms, SUSPEND_DELAY as i64);
        assert_eq!(
            engine.state(),
            ActivationState::Listening {
                suspend_deadline_ms: Some(SUSPEND_DELAY as i64)
            }
        );

        assert_eq!(
            engine.on_suspend_timer(token, SUSPEND_DELAY as i64),
            Transition::Deactivated
        );
        assert_eq!(engine.state(), ActivationState::Inactive);
        assert_eq!(engine.on_raw_sample(Sample::new(3000, 400.0)), None);
    }
}

#[cfg(test)]
mod timer_tests {
    use super::*;

    #[test]
    fn test_stale_timer_is_ignored() {
        let (mut engine, _) = engine(ActivationMode::ActiveWhileLandscape, false);
        engine.start(0);
        let stale = engine.pending_suspend().unwrap();

        // Rotating to landscape cancels, rotating back re-arms with a new deadline
        engine.notify_orientation_changed(true, 1000);
        assert_eq!(engine.pending_suspend(), None);
        engine.notify_orientation_changed(false, 1500);
        let fresh = engine.pending_suspend().unwrap();
        assert_eq!(fresh.deadline_ms, 1500 + SUSPEND_DELAY as i64);

        assert_eq!(
            engine.on_suspend_timer(stale, SUSPEND_DELAY as i64),
            Transition::Unchanged
        );
        assert!(matches!(engine.state(), ActivationState::Listening { .. }));

        assert_eq!(
            engine.on_suspend_timer(fresh, fresh.deadline_ms),
            Transition::Deactivated
        );
    }

    #[test]
    fn test_timer_from_previous_session_cannot_stop_new_one() {
        let (mut engine, _) = engine(ActivationMode::ActiveWhilePortrait, true);
        engine.start(0);
        let old = engine.pending_suspend().unwrap();

        engine.stop();
        engine.start(100);
        assert_eq!(
            engine.on_suspend_timer(old, old.deadline_ms),
            Transition::Unchanged
        );
        assert!(matches!(engine.state(), ActivationState::Listening { .. }));
    }

    #[test]
    fn test_suspended_engine_ignores_further_mismatched_rotation() {
        let (mut engine, sink) = engine(ActivationMode::ActiveWhileLandscape, false);
        engine.start(0);
        let token = engine.pending_suspend().unwrap();
        assert_eq!(
            engine.on_suspend_timer(token, token.deadline_ms),
            Transition::Deactivated
        );

        assert_eq!(
            engine.notify_orientation_changed(false, 10_000),
            Transition::Unchanged
        );
        assert_eq!(engine.state(), ActivationState::Inactive);
        assert_eq!(engine.on_raw_sample(Sample::new(10_100, 400.0)), None);
        assert!(sink.values().is_empty());
    }

    #[test]
    fn test_matching_orientation_never_arms_timer() {
        let (mut landscape, _) = engine(ActivationMode::ActiveWhileLandscape, true);
        landscape.start(0);
        assert_eq!(landscape.pending_suspend(), None);

        let (mut always, _) = engine(ActivationMode::Always, false);
        always.start(0);
        always.notify_orientation_changed(true, 10);
        assert_eq!(always.pending_suspend(), None);
    }
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    #[test]
    fn test_reconfigure_switches_mode_and_curve() {
        let (mut engine, sink) = engine(ActivationMode::Always, false);
        engine.start(0);
        engine.on_raw_sample(Sample::new(0, 100.0));

        let mut replacement = settings(ActivationMode::ActiveWhileLandscape);
        replacement.curve = ControlCurve::from_config_pairs(&[(0.0, 0), (1000.0, 200)]).unwrap();
        engine.reconfigure(replacement, 1000);

        assert_eq!(engine.mode(), ActivationMode::ActiveWhileLandscape);
        assert_eq!(
            engine.pending_suspend().map(|token| token.deadline_ms),
            Some(1000 + SUSPEND_DELAY as i64)
        );

        // The new curve drives the next emission
        let expected = engine.curve().interpolate(5000.0);
        assert_eq!(engine.on_raw_sample(Sample::new(1100, 5000.0)), Some(expected));
        assert_eq!(sink.values(), vec![80, 200]);
    }

    #[test]
    fn test_window_strategy_averages_recent_readings() {
        let mut window = settings(ActivationMode::Always);
        window.smoothing = SmoothingStrategy::Window { window_ms: 1000 };
        let (mut engine, _) = engine_with(window, false);
        engine.start(0);

        assert_eq!(engine.on_raw_sample(Sample::new(0, 100.0)), Some(80));
        assert_eq!(engine.on_raw_sample(Sample::new(500, 100.0)), None);

        // Mean of 100, 100 and 1000
        let expected = reference_curve().interpolate(400.0);
        assert_eq!(
            engine.on_raw_sample(Sample::new(600, 1000.0)),
            Some(expected)
        );
    }

    #[test]
    fn test_screen_on_bypasses_smoothing_in_continuous_mode() {
        let (mut engine, _) = engine(ActivationMode::Always, false);
        engine.start(0);
        engine.on_raw_sample(Sample::new(0, 10.0));

        // Without the override the EMA would ease toward 1000 lux
        engine.notify_screen_off();
        engine.notify_unlock_or_screen_on(100);
        assert_eq!(engine.on_raw_sample(Sample::new(150, 1000.0)), Some(255));
        assert!(!engine.immediate_pending());
        assert_eq!(engine.last_sensor_value(), 1000);
        assert_eq!(engine.last_applied_brightness(), 255);
    }
}

#[cfg(test)]
mod simulate_tests {
    use super::*;

    #[test]
    fn test_replay_of_rotation_trace() {
        let trace = "\
# start in portrait, rotate to landscape in time, then back
0     lux 100
1000  landscape
4000  lux 1000
5000  portrait
";
        let events = parse_trace(trace).unwrap();
        let report = replay(
            settings(ActivationMode::ActiveWhileLandscape),
            false,
            &events,
            false,
        );

        // Landscape at 1000ms cancelled the first grace period
        let eased = reference_curve().interpolate(smoothed_after_gap(100.0, 1000.0, 4000));
        assert_eq!(
            report.outcomes,
            vec![
                TraceOutcome::Activated { at_ms: 0 },
                TraceOutcome::Emitted {
                    at_ms: 0,
                    brightness: 80
                },
                TraceOutcome::Emitted {
                    at_ms: 4000,
                    brightness: eased
                },
                TraceOutcome::Suspended {
                    at_ms: 5000 + SUSPEND_DELAY as i64
                },
            ]
        );
        assert!(eased < 255);
        assert_eq!(report.last_sensor_value, 1000);
        assert_eq!(report.applied, vec![80, eased]);
    }

    fn smoothed_after_gap(from: f64, to: f64, dt_ms: i64) -> f64 {
        let alpha = 1.0 - (-(dt_ms as f64) / 2500.0).exp();
        from + alpha * (to - from)
    }
}
