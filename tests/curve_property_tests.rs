use autolight::core::{
    curve::{ControlCurve, ControlPoint},
    hysteresis::HysteresisGate,
    sample::Sample,
    smoothing::{SmoothingStrategy, TemporalSmoother},
};
use proptest::prelude::*;

/// Curves with strictly increasing thresholds and non-decreasing brightness
fn monotone_curve_strategy() -> impl Strategy<Value = ControlCurve> {
    (
        0.0..100.0f64,
        0u8..60,
        prop::collection::vec((0.5..2000.0f64, 0u8..50), 1..8),
    )
        .prop_map(|(start_lux, start_brightness, steps)| {
            let mut lux = start_lux;
            let mut brightness = start_brightness;
            let mut points = vec![ControlPoint::new(lux, brightness)];
            for (gap, rise) in steps {
                lux += gap;
                brightness = brightness.saturating_add(rise);
                points.push(ControlPoint::new(lux, brightness));
            }
            points
        })
        .prop_map(|points| {
            ControlCurve::validated(points).expect("generated points are strictly increasing")
        })
}

/// Arbitrary, possibly degenerate curves (duplicates, descending brightness)
fn any_curve_strategy() -> impl Strategy<Value = ControlCurve> {
    prop::collection::vec((0.0..100_000.0f64, any::<u8>()), 1..10).prop_map(|pairs| {
        let mut points: Vec<ControlPoint> = pairs
            .into_iter()
            .map(|(lux, brightness)| ControlPoint::new(lux, brightness))
            .collect();
        // Force at least one duplicate threshold
        if let Some(first) = points.first().copied() {
            points.push(ControlPoint::new(first.lux, first.brightness.wrapping_add(77)));
        }
        ControlCurve::from_points(points)
    })
}

#[cfg(test)]
mod curve_tests {
    use super::*;

    proptest! {
        /// Non-decreasing brightnesses give a non-decreasing curve
        #[test]
        fn test_curve_is_monotonic(
            curve in monotone_curve_strategy(),
            a in 0.0..20_000.0f64,
            b in 0.0..20_000.0f64,
        ) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                curve.interpolate(low) <= curve.interpolate(high),
                "interpolate({low}) > interpolate({high})"
            );
        }

        /// Evaluating exactly at a knot returns that knot's brightness
        #[test]
        fn test_knots_are_exact(curve in monotone_curve_strategy()) {
            for point in curve.points() {
                prop_assert_eq!(curve.interpolate(point.lux), point.brightness);
            }
        }

        /// Output stays within the configured brightness span, even for degenerate curves
        #[test]
        fn test_output_within_configured_span(
            curve in any_curve_strategy(),
            lux in 0.0..1_000_000.0f64,
        ) {
            let min = curve.points().iter().map(|p| p.brightness).min().unwrap();
            let max = curve.points().iter().map(|p| p.brightness).max().unwrap();
            let brightness = curve.interpolate(lux);
            prop_assert!(brightness >= min && brightness <= max);
        }

        /// Values outside the configured range clamp to the end points
        #[test]
        fn test_clamps_outside_range(curve in monotone_curve_strategy(), excess in 0.0..1e7f64) {
            let first = curve.points()[0];
            let last = curve.points()[curve.points().len() - 1];
            prop_assert_eq!(curve.interpolate(last.lux + excess), last.brightness);
            prop_assert_eq!(curve.interpolate((first.lux - excess).max(0.0)), first.brightness);
        }
    }
}

#[cfg(test)]
mod gate_tests {
    use super::*;

    proptest! {
        /// The first candidate always passes
        #[test]
        fn test_first_candidate_passes(
            relative in 0.0..1.0f64,
            floor in 0.0..100.0f64,
            lux in 0.0..100_000.0f64,
        ) {
            prop_assert!(HysteresisGate::new(relative, floor).should_apply(lux));
        }

        /// A change below both thresholds is held
        #[test]
        fn test_small_change_is_held(
            relative in 0.0..1.0f64,
            floor in 0.5..100.0f64,
            last in 0.0..100_000.0f64,
            fraction in 0.0..0.99f64,
            upward in any::<bool>(),
        ) {
            let mut gate = HysteresisGate::new(relative, floor);
            gate.record(last);

            let threshold = (last * relative).max(floor);
            let diff = threshold * fraction;
            let candidate = if upward { last + diff } else { last - diff };
            prop_assert!(!gate.should_apply(candidate));
        }

        /// A change beyond the larger threshold passes
        #[test]
        fn test_large_change_passes(
            relative in 0.0..1.0f64,
            floor in 0.0..100.0f64,
            last in 0.0..100_000.0f64,
            margin in 0.01..1000.0f64,
            upward in any::<bool>(),
        ) {
            let mut gate = HysteresisGate::new(relative, floor);
            gate.record(last);

            let diff = (last * relative).max(floor) + margin;
            let candidate = if upward { last + diff } else { last - diff };
            prop_assert!(gate.should_apply(candidate));
        }
    }
}

#[cfg(test)]
mod smoother_tests {
    use super::*;

    proptest! {
        /// A single sample seeds the filter exactly
        #[test]
        fn test_single_sample_seeds(
            time_constant_ms in 100u64..60_000,
            timestamp_ms in 0i64..1_000_000,
            lux in 0.0..100_000.0f64,
        ) {
            let mut smoother =
                TemporalSmoother::new(SmoothingStrategy::Exponential { time_constant_ms });
            prop_assert_eq!(smoother.ingest(Sample::new(timestamp_ms, lux)), lux);
            prop_assert_eq!(smoother.value(), Some(lux));
        }

        /// Constant input converges within a number of steps proportional to tau
        #[test]
        fn test_constant_input_converges(
            time_constant_ms in 100u64..60_000,
            seed in 0.0..100_000.0f64,
            target in 0.0..100_000.0f64,
        ) {
            let mut smoother =
                TemporalSmoother::new(SmoothingStrategy::Exponential { time_constant_ms });
            smoother.ingest(Sample::new(0, seed));

            // Ten time constants in steps of tau/10
            let step = (time_constant_ms / 10).max(1) as i64;
            let mut timestamp = 0;
            let mut value = seed;
            while timestamp < 10 * time_constant_ms as i64 {
                timestamp += step;
                value = smoother.ingest(Sample::new(timestamp, target));
            }

            // e^-10 of the initial error is left at most
            let tolerance = (seed - target).abs() * 1e-4 + 1e-6;
            prop_assert!((value - target).abs() <= tolerance, "value {value} target {target}");
        }

        /// The window mean never leaves the range of the samples it holds
        #[test]
        fn test_window_mean_within_sample_range(
            window_ms in 100u64..10_000,
            readings in prop::collection::vec((1i64..500, 0.0..10_000.0f64), 1..40),
        ) {
            let mut smoother = TemporalSmoother::new(SmoothingStrategy::Window { window_ms });
            let mut timestamp = 0;
            for (gap, lux) in &readings {
                timestamp += gap;
                smoother.ingest(Sample::new(timestamp, *lux));
            }
            let value = smoother.value().unwrap();
            let min = readings.iter().map(|(_, lux)| *lux).fold(f64::INFINITY, f64::min);
            let max = readings.iter().map(|(_, lux)| *lux).fold(0.0, f64::max);
            prop_assert!(value >= min - 1e-6 && value <= max + 1e-6);
        }
    }
}
