//! Brightness engine: raw samples in, target brightness out.
//!
//! The engine owns one instance of every core component and wires them together:
//!
//! ```text
//! sample -> (immediate/one-shot?) -> ControlCurve -> sink
//!                 \-> TemporalSmoother -> HysteresisGate -> ControlCurve -> sink
//! ```
//!
//! Activation decisions come from [`ActivationController`]; the engine turns its
//! transitions into sensor subscription changes and state resets. All methods run to
//! completion on the caller's thread; nothing here blocks or spawns.

use anyhow::Result;

use super::{
    activation::{ActivationController, ActivationMode, ActivationState, SuspendToken, Transition},
    curve::ControlCurve,
    hysteresis::HysteresisGate,
    sample::Sample,
    smoothing::{SmoothingStrategy, TemporalSmoother},
};
use crate::common::constants::*;
use crate::config::Config;

/// Receives target brightness values. Writes are best-effort.
#[cfg_attr(test, mockall::automock)]
pub trait BrightnessSink {
    fn apply(&mut self, brightness: u8) -> Result<()>;
}

/// Controls whether the light sensor is delivering samples.
#[cfg_attr(test, mockall::automock)]
pub trait SensorSubscription {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self);
}

/// Subscription for sources that deliver samples regardless (stdin, traces, tests).
#[derive(Debug, Default)]
pub struct AlwaysSubscribed;

impl SensorSubscription for AlwaysSubscribed {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) {}
}

/// Engine parameters resolved from the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub curve: ControlCurve,
    pub mode: ActivationMode,
    pub suspend_delay_ms: u64,
    pub smoothing: SmoothingStrategy,
    pub relative_threshold: f64,
    pub absolute_threshold: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl EngineSettings {
    /// Resolve settings, falling back to the constant-brightness curve when the
    /// configured control points are unusable.
    pub fn from_config(config: &Config) -> Self {
        let (curve, error) = resolve_curve(config);
        if let Some(e) = error {
            log_warning!("Invalid brightness curve: {e}");
            log_indented!("Using constant brightness {DEFAULT_BRIGHTNESS} until fixed");
        }

        Self {
            curve,
            mode: config.mode.unwrap_or(DEFAULT_MODE),
            suspend_delay_ms: config.suspend_delay.unwrap_or(DEFAULT_SUSPEND_DELAY),
            smoothing: config.smoothing_strategy(),
            relative_threshold: config
                .relative_threshold
                .unwrap_or(DEFAULT_RELATIVE_THRESHOLD),
            absolute_threshold: config
                .absolute_threshold
                .unwrap_or(DEFAULT_ABSOLUTE_THRESHOLD),
        }
    }
}

/// Curve for `config`, plus the error that forced the constant fallback, if any.
pub fn resolve_curve(config: &Config) -> (ControlCurve, Option<anyhow::Error>) {
    let pairs = config.points.as_deref().unwrap_or(&DEFAULT_POINTS);
    match ControlCurve::from_config_pairs(pairs) {
        Ok(curve) => (curve, None),
        Err(e) => (ControlCurve::fallback(), Some(e)),
    }
}

pub struct BrightnessEngine {
    curve: ControlCurve,
    smoother: TemporalSmoother,
    gate: HysteresisGate,
    activation: ActivationController,
    sink: Box<dyn BrightnessSink>,
    sensor: Box<dyn SensorSubscription>,
    last_sensor_lux: f64,
    last_applied_brightness: u8,
    debug_enabled: bool,
}

impl BrightnessEngine {
    pub fn new(
        settings: EngineSettings,
        landscape: bool,
        sink: Box<dyn BrightnessSink>,
        sensor: Box<dyn SensorSubscription>,
    ) -> Self {
        Self {
            smoother: TemporalSmoother::new(settings.smoothing),
            gate: HysteresisGate::new(settings.relative_threshold, settings.absolute_threshold),
            activation: ActivationController::new(
                settings.mode,
                settings.suspend_delay_ms,
                landscape,
            ),
            curve: settings.curve,
            sink,
            sensor,
            last_sensor_lux: 0.0,
            last_applied_brightness: 0,
            debug_enabled: false,
        }
    }

    /// Emit debug traces for dropped samples, gate decisions and transitions.
    pub fn with_debug(mut self, debug_enabled: bool) -> Self {
        self.debug_enabled = debug_enabled;
        self
    }

    pub fn start(&mut self, now_ms: i64) -> Transition {
        let transition = self.activation.start(now_ms);
        self.handle_transition(transition);
        transition
    }

    pub fn stop(&mut self) -> Transition {
        let transition = self.activation.stop();
        self.handle_transition(transition);
        transition
    }

    /// Process one raw sample. Returns the brightness if one was emitted.
    pub fn on_raw_sample(&mut self, sample: Sample) -> Option<u8> {
        if !sample.is_valid() {
            if self.debug_enabled {
                log_debug!("Dropped invalid sample: {} lux", sample.lux);
            }
            return None;
        }
        if !self.activation.is_listening() {
            return None;
        }

        if self.activation.immediate_pending() || self.mode() == ActivationMode::OnUnlockOnce {
            return Some(self.apply_immediate(sample));
        }

        let smoothed = self.smoother.ingest(sample);
        if !self.gate.should_apply(smoothed) {
            if self.debug_enabled {
                log_debug!("Holding brightness: {smoothed:.1} lux within hysteresis band");
            }
            return None;
        }

        let brightness = self.curve.interpolate(smoothed);
        self.emit(sample.lux, brightness);
        self.gate.record(smoothed);
        Some(brightness)
    }

    /// Bypass smoothing and apply the raw reading, then re-seed the filters from it.
    fn apply_immediate(&mut self, sample: Sample) -> u8 {
        let brightness = self.curve.interpolate(sample.lux);
        self.emit(sample.lux, brightness);

        self.smoother.reset();
        self.smoother.ingest(sample);
        self.gate.record(sample.lux);

        let transition = self.activation.complete_one_shot();
        self.handle_transition(transition);
        brightness
    }

    fn emit(&mut self, raw_lux: f64, brightness: u8) {
        // State advances even if the sink refuses the write
        self.last_sensor_lux = raw_lux;
        self.last_applied_brightness = brightness;

        if self.debug_enabled {
            log_debug!("{raw_lux:.1} lux -> brightness {brightness}");
        }
        if let Err(e) = self.sink.apply(brightness) {
            log_warning!("Failed to apply brightness {brightness}: {e}");
        }
    }

    pub fn notify_orientation_changed(&mut self, landscape: bool, now_ms: i64) -> Transition {
        let transition = self.activation.notify_orientation_changed(landscape, now_ms);
        self.handle_transition(transition);
        transition
    }

    pub fn notify_unlock_or_screen_on(&mut self, now_ms: i64) -> Transition {
        let transition = self.activation.notify_unlock_or_screen_on(now_ms);
        self.handle_transition(transition);
        transition
    }

    pub fn notify_screen_off(&mut self) {
        self.activation.notify_screen_off();
    }

    /// Swap in new settings atomically and restart activation under them.
    pub fn reconfigure(&mut self, settings: EngineSettings, now_ms: i64) -> Transition {
        if self.activation.is_listening() {
            self.sensor.stop();
        }

        self.curve = settings.curve;
        self.smoother = TemporalSmoother::new(settings.smoothing);
        self.gate = HysteresisGate::new(settings.relative_threshold, settings.absolute_threshold);

        let transition =
            self.activation
                .reconfigure(settings.mode, settings.suspend_delay_ms, now_ms);
        self.handle_transition(transition);
        transition
    }

    pub fn on_suspend_timer(&mut self, token: SuspendToken, now_ms: i64) -> Transition {
        let transition = self.activation.on_suspend_timer(token, now_ms);
        self.handle_transition(transition);
        transition
    }

    fn handle_transition(&mut self, transition: Transition) {
        match transition {
            Transition::Unchanged => {}
            Transition::Activated { reset_gate } => {
                self.smoother.reset();
                if reset_gate {
                    self.gate.reset();
                }
                if let Err(e) = self.sensor.start() {
                    log_warning!("Failed to start light sensor: {e}");
                }
                if self.debug_enabled {
                    log_debug!("Sampling started (mode: {})", self.mode());
                }
            }
            Transition::Deactivated => {
                self.sensor.stop();
                if self.debug_enabled {
                    log_debug!("Sampling suspended");
                }
            }
        }
    }

    pub fn pending_suspend(&self) -> Option<SuspendToken> {
        self.activation.pending_suspend()
    }

    pub fn state(&self) -> ActivationState {
        self.activation.state()
    }

    pub fn mode(&self) -> ActivationMode {
        self.activation.mode()
    }

    pub fn curve(&self) -> &ControlCurve {
        &self.curve
    }

    pub fn immediate_pending(&self) -> bool {
        self.activation.immediate_pending()
    }

    /// Raw lux of the sample behind the last emission, truncated.
    pub fn last_sensor_value(&self) -> i64 {
        self.last_sensor_lux as i64
    }

    pub fn last_applied_brightness(&self) -> u8 {
        self.last_applied_brightness
    }
}
