//! Core event loop and brightness pipeline.
//!
//! The submodules hold the pure pipeline stages (curve, smoothing, hysteresis,
//! activation) and the [`engine::BrightnessEngine`] that composes them. [`Core`] owns the
//! engine at runtime: it receives [`Event`]s from the collaborator threads, stamps light
//! readings with the monotonic clock and fires the suspend timer when it falls due.
//!
//! Everything that touches engine state runs on the loop thread, so events are handled
//! strictly one after another.

pub mod activation;
pub mod curve;
pub mod engine;
pub mod hysteresis;
pub mod sample;
pub mod smoothing;

use anyhow::Result;
use std::sync::atomic::Ordering;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use crate::{
    common::{constants::*, utils},
    config::{self, Config},
    core::{
        activation::Transition,
        engine::{BrightnessEngine, EngineSettings},
        sample::Sample,
    },
    io::{events::Event, signals::SignalState},
    time_source::Clock,
};

/// What an event did to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineUpdate {
    /// A brightness value was sent to the sink
    Emitted(u8),
    /// Sampling started or stopped
    Changed(Transition),
    /// Handled without visible effect
    Quiet,
    /// Reload and shutdown are handled by the caller
    NotForEngine,
}

/// Route one event to the matching engine operation.
pub fn dispatch_event(engine: &mut BrightnessEngine, event: Event, now_ms: i64) -> EngineUpdate {
    let transition = match event {
        Event::Light { lux } => {
            return match engine.on_raw_sample(Sample::new(now_ms, lux)) {
                Some(brightness) => EngineUpdate::Emitted(brightness),
                None => EngineUpdate::Quiet,
            };
        }
        Event::Orientation { landscape } => engine.notify_orientation_changed(landscape, now_ms),
        Event::Wake => engine.notify_unlock_or_screen_on(now_ms),
        Event::ScreenOff => {
            engine.notify_screen_off();
            Transition::Unchanged
        }
        Event::Reload | Event::Shutdown => return EngineUpdate::NotForEngine,
    };

    match transition {
        Transition::Unchanged => EngineUpdate::Quiet,
        changed => EngineUpdate::Changed(changed),
    }
}

/// Fire the suspend timer if its deadline has passed.
pub fn fire_due_timer(engine: &mut BrightnessEngine, now_ms: i64) -> Transition {
    match engine.pending_suspend() {
        Some(token) if token.deadline_ms <= now_ms => engine.on_suspend_timer(token, now_ms),
        _ => Transition::Unchanged,
    }
}

/// Parameters for creating a Core instance.
pub(crate) struct CoreParams {
    pub engine: BrightnessEngine,
    pub config: Config,
    pub signal_state: SignalState,
    pub clock: Box<dyn Clock>,
    pub debug_enabled: bool,
}

/// Runtime owner of the engine.
pub(crate) struct Core {
    engine: BrightnessEngine,
    config: Config,
    signal_state: SignalState,
    clock: Box<dyn Clock>,
    debug_enabled: bool,
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        Self {
            engine: params.engine,
            config: params.config,
            signal_state: params.signal_state,
            clock: params.clock,
            debug_enabled: params.debug_enabled,
        }
    }

    /// Start the engine, run until shutdown, then stop it and report diagnostics.
    pub fn execute(mut self) -> Result<()> {
        if let Some(custom_dir) = config::get_custom_config_dir() {
            log_block_start!("Base directory: {}", utils::private_path(&custom_dir));
        }

        log_block_start!("Starting brightness engine (mode: {})", self.engine.mode());
        let now = self.clock.now_ms();
        self.engine.start(now);

        let result = self.main_loop();

        self.engine.stop();
        log_block_start!("Shutting down autolight...");
        log_indented!("Last sensor value: {} lux", self.engine.last_sensor_value());
        log_indented!(
            "Last applied brightness: {}",
            self.engine.last_applied_brightness()
        );
        log_end!();

        result
    }

    fn main_loop(&mut self) -> Result<()> {
        while self.signal_state.running.load(Ordering::SeqCst) {
            let now = self.clock.now_ms();
            if fire_due_timer(&mut self.engine, now) == Transition::Deactivated {
                log_decorated!("Sampling suspended");
            }

            match self
                .signal_state
                .event_receiver
                .recv_timeout(self.next_wakeup(now))
            {
                Ok(event) => self.handle_event(event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log_pipe!();
                    log_error!("Event channel closed unexpectedly");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Block no longer than the pending suspend deadline or the idle wakeup.
    fn next_wakeup(&self, now_ms: i64) -> Duration {
        let idle = IDLE_WAKEUP_MS as i64;
        let millis = match self.engine.pending_suspend() {
            Some(token) => (token.deadline_ms - now_ms).clamp(0, idle),
            None => idle,
        };
        Duration::from_millis(millis as u64)
    }

    fn handle_event(&mut self, event: Event) {
        if self.debug_enabled && !matches!(event, Event::Light { .. }) {
            log_pipe!();
            log_debug!("Event: {}", event.describe());
        }

        let now = self.clock.now_ms();
        match event {
            Event::Reload => self.reload_config(now),
            Event::Shutdown => self.signal_state.running.store(false, Ordering::SeqCst),
            other => match dispatch_event(&mut self.engine, other, now) {
                EngineUpdate::Changed(Transition::Activated { .. }) => {
                    log_decorated!("Sampling ambient light");
                }
                EngineUpdate::Changed(Transition::Deactivated) => {
                    log_decorated!("Sampling suspended");
                }
                _ => {}
            },
        }
    }

    /// Re-read the configuration. On failure the running configuration stays active.
    fn reload_config(&mut self, now_ms: i64) {
        log_block_start!("Reloading configuration");

        let new_config = match Config::load() {
            Ok(config) => config,
            Err(e) => {
                log_pipe!();
                log_error!("Failed to reload configuration: {e:#}");
                log_indented!("Keeping the previous configuration");
                return;
            }
        };

        if new_config == self.config {
            log_decorated!("Configuration unchanged");
            return;
        }

        if new_config.devices_differ(&self.config) {
            log_pipe!();
            log_warning!("Sensor and backlight settings take effect after a restart");
        }

        self.engine
            .reconfigure(EngineSettings::from_config(&new_config), now_ms);
        new_config.log_config();
        self.config = new_config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::test_constants::*;
    use crate::core::{
        activation::{ActivationMode, ActivationState},
        curve::ControlCurve,
        engine::AlwaysSubscribed,
        smoothing::SmoothingStrategy,
    };
    use crate::io::backlight::RecordingSink;
    use crate::time_source::SimulatedClock;

    fn engine(mode: ActivationMode, sink: RecordingSink) -> BrightnessEngine {
        let settings = EngineSettings {
            curve: ControlCurve::from_config_pairs(&TEST_REFERENCE_POINTS).unwrap(),
            mode,
            suspend_delay_ms: TEST_SUSPEND_DELAY,
            smoothing: SmoothingStrategy::Exponential {
                time_constant_ms: TEST_TIME_CONSTANT,
            },
            relative_threshold: DEFAULT_RELATIVE_THRESHOLD,
            absolute_threshold: DEFAULT_ABSOLUTE_THRESHOLD,
        };
        BrightnessEngine::new(settings, false, Box::new(sink), Box::new(AlwaysSubscribed))
    }

    #[test]
    fn test_dispatch_routes_events() {
        let sink = RecordingSink::new();
        let mut engine = engine(ActivationMode::ActiveWhileLandscape, sink.clone());

        assert_eq!(
            dispatch_event(&mut engine, Event::Wake, 0),
            EngineUpdate::Changed(Transition::Activated { reset_gate: true })
        );
        assert_eq!(
            dispatch_event(&mut engine, Event::Light { lux: 100.0 }, 10),
            EngineUpdate::Emitted(80)
        );
        assert_eq!(
            dispatch_event(&mut engine, Event::Orientation { landscape: true }, 20),
            EngineUpdate::Quiet
        );
        assert_eq!(engine.pending_suspend(), None);
        assert_eq!(
            dispatch_event(&mut engine, Event::Reload, 30),
            EngineUpdate::NotForEngine
        );
        assert_eq!(sink.values(), vec![80]);
    }

    #[test]
    fn test_fire_due_timer_waits_for_deadline() {
        let mut engine = engine(ActivationMode::ActiveWhileLandscape, RecordingSink::new());
        engine.start(0);

        let deadline = TEST_SUSPEND_DELAY as i64;
        assert_eq!(fire_due_timer(&mut engine, deadline - 1), Transition::Unchanged);
        assert!(matches!(engine.state(), ActivationState::Listening { .. }));
        assert_eq!(fire_due_timer(&mut engine, deadline), Transition::Deactivated);
        assert_eq!(engine.state(), ActivationState::Inactive);
    }

    #[test]
    fn test_core_runs_until_shutdown() {
        let sink = RecordingSink::new();
        let clock = SimulatedClock::new(0);
        let signal_state = SignalState::detached();
        let sender = signal_state.event_sender.clone();

        let core = Core::new(CoreParams {
            engine: engine(ActivationMode::Always, sink.clone()),
            config: Config::default(),
            signal_state,
            clock: Box::new(clock.clone()),
            debug_enabled: false,
        });

        sender.send(Event::Light { lux: 10.0 }).unwrap();
        sender.send(Event::ScreenOff).unwrap();
        sender.send(Event::Wake).unwrap();
        sender.send(Event::Light { lux: 1000.0 }).unwrap();
        sender.send(Event::Shutdown).unwrap();

        core.execute().unwrap();
        assert_eq!(sink.values(), vec![30, 255]);
    }
}
