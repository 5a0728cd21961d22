//! Application coordinator that manages the complete lifecycle of autolight.
//!
//! Loads the configuration, opens the backlight and light sensor, starts the
//! collaborator threads (signals, logind monitor, config watcher) and hands everything
//! to the [`Core`] loop. Collaborators that are unavailable degrade gracefully: a
//! missing sensor falls back to standard input, a missing backlight to logging, a
//! missing D-Bus to signal-only wake triggers.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::Sender;
use std::time::Duration;

use crate::{
    common::{constants::*, logger::Log, utils::private_path},
    config::{self, BacklightTarget, Config, SensorSource},
    core::{
        Core, CoreParams,
        engine::{AlwaysSubscribed, BrightnessEngine, BrightnessSink, EngineSettings, SensorSubscription},
    },
    io::{
        backlight::{BacklightSink, LogSink},
        dbus,
        events::Event,
        sensor::{IioLightSensor, spawn_stdin_source},
        signals::setup_signal_handler,
    },
    time_source::MonotonicClock,
};

/// Builder for configuring and running the autolight daemon.
///
/// ```no_run
/// use autolight::Autolight;
///
/// # fn main() -> anyhow::Result<()> {
/// Autolight::new(false).run()?;
/// # Ok(())
/// # }
/// ```
pub struct Autolight {
    debug_enabled: bool,
    show_headers: bool,
}

impl Autolight {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            show_headers: true,
        }
    }

    /// Skip the version header (when the caller already printed one)
    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    /// Run the daemon until a shutdown is requested.
    pub fn run(self) -> Result<()> {
        if self.show_headers {
            log_version!();
        }
        if self.debug_enabled {
            Log::set_timestamps(true);
        }

        let config = match Config::load() {
            Ok(config) => config,
            Err(e) => {
                log_error_exit!("Configuration failed");
                eprintln!("{e:?}");
                std::process::exit(EXIT_FAILURE);
            }
        };
        config.log_config();

        let signal_state = setup_signal_handler(self.debug_enabled)?;
        let sender = signal_state.event_sender.clone();

        let sink = create_sink(&config)?;
        let sensor = create_sensor(&config, sender.clone(), signal_state.running.clone())?;

        dbus::start_logind_monitor(sender.clone(), self.debug_enabled);

        match config::get_config_path() {
            Ok(config_path) => {
                if let Err(e) =
                    config::start_config_watcher(config_path, sender, self.debug_enabled)
                {
                    log_pipe!();
                    log_warning!("Config hot reload unavailable: {e}");
                    log_indented!("Send SIGUSR2 to reload the configuration manually");
                }
            }
            Err(e) => {
                log_pipe!();
                log_warning!("Config hot reload unavailable: {e}");
            }
        }

        let engine = BrightnessEngine::new(
            EngineSettings::from_config(&config),
            config.starts_in_landscape(),
            sink,
            sensor,
        )
        .with_debug(self.debug_enabled);

        let core = Core::new(CoreParams {
            engine,
            config,
            signal_state,
            clock: Box::new(MonotonicClock::new()),
            debug_enabled: self.debug_enabled,
        });

        core.execute()
    }
}

/// Open the configured backlight, or a logging sink when there is none.
fn create_sink(config: &Config) -> Result<Box<dyn BrightnessSink>> {
    match config.backlight_target() {
        BacklightTarget::None => {
            log_block_start!("No backlight configured, logging brightness targets");
            Ok(Box::new(LogSink))
        }
        BacklightTarget::Device(path) => {
            let sink = BacklightSink::open(&path)
                .with_context(|| format!("Failed to open backlight {}", private_path(&path)))?;
            log_block_start!("Backlight: {}", private_path(sink.device()));
            Ok(Box::new(sink))
        }
        BacklightTarget::Auto => match BacklightSink::discover() {
            Ok(sink) => {
                log_block_start!("Detected backlight: {}", private_path(sink.device()));
                log_indented!("Maximum raw brightness: {}", sink.max_brightness());
                Ok(Box::new(sink))
            }
            Err(e) => {
                log_pipe!();
                log_warning!("No usable backlight found: {e}");
                log_indented!("Brightness targets will only be logged");
                Ok(Box::new(LogSink))
            }
        },
    }
}

/// Start the configured light source and return the handle the engine toggles.
fn create_sensor(
    config: &Config,
    sender: Sender<Event>,
    running: Arc<AtomicBool>,
) -> Result<Box<dyn SensorSubscription>> {
    let poll_interval =
        Duration::from_millis(config.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL));

    let sensor = match config.sensor_source() {
        SensorSource::Stdin => None,
        SensorSource::Device(path) => Some(
            IioLightSensor::open(&path)
                .with_context(|| format!("Failed to open light sensor {}", private_path(&path)))?,
        ),
        SensorSource::Auto => match IioLightSensor::discover() {
            Ok(sensor) => Some(sensor),
            Err(e) => {
                log_pipe!();
                log_warning!("No ambient light sensor found: {e}");
                log_indented!("Reading events from standard input instead");
                None
            }
        },
    };

    match sensor {
        Some(sensor) => {
            log_block_start!("Light sensor: {}", private_path(sensor.device()));
            Ok(Box::new(sensor.spawn_poller(sender, poll_interval, running)))
        }
        None => {
            log_block_start!("Reading events from standard input");
            log_indented!("e.g. 'lux 230', 'landscape', 'unlock', 'quit'");
            spawn_stdin_source(sender);
            Ok(Box::new(AlwaysSubscribed))
        }
    }
}
