//! systemd-logind monitoring over D-Bus.
//!
//! Two signal streams are translated into lifecycle events:
//!
//! - `Manager.PrepareForSleep(start)`: `true` becomes [`Event::ScreenOff`], `false`
//!   (resume) becomes [`Event::Wake`]
//! - `Session.Lock` / `Session.Unlock` on the caller's session: [`Event::ScreenOff`] and
//!   [`Event::Wake`]
//!
//! Each stream runs in its own thread using zbus's blocking API. If the system bus or
//! logind is unavailable the daemon keeps running without these triggers.

use anyhow::{Context, Result};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;
use zbus::blocking::Connection;

use crate::io::events::Event;

/// D-Bus proxy for the systemd-logind Manager interface.
#[zbus::proxy(
    interface = "org.freedesktop.login1.Manager",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1"
)]
trait LogindManager {
    /// `start` is `true` before suspend and `false` after resume.
    #[zbus(signal)]
    fn prepare_for_sleep(&self, start: bool) -> zbus::Result<()>;
}

/// D-Bus proxy for the logind Session interface of the calling process's session.
#[zbus::proxy(
    interface = "org.freedesktop.login1.Session",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1/session/auto"
)]
trait LogindSession {
    #[zbus(signal)]
    fn lock(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn unlock(&self) -> zbus::Result<()>;
}

const MAX_MONITOR_RESTARTS: u8 = 3;
const RESTART_DELAY_MS: u64 = 2000;

/// Map a PrepareForSleep payload to the lifecycle event it implies.
pub fn event_for_sleep(going_to_sleep: bool) -> Event {
    if going_to_sleep {
        Event::ScreenOff
    } else {
        Event::Wake
    }
}

/// Spawn the sleep and session monitors.
pub fn start_logind_monitor(sender: Sender<Event>, debug_enabled: bool) {
    spawn_with_restarts("Sleep monitor", sender.clone(), debug_enabled, monitor_sleep_signals);
    spawn_with_restarts("Session monitor", sender, debug_enabled, monitor_session_signals);
}

fn spawn_with_restarts(
    name: &'static str,
    sender: Sender<Event>,
    debug_enabled: bool,
    monitor: fn(&Sender<Event>, bool) -> Result<()>,
) {
    thread::spawn(move || {
        let mut attempt = 0;
        loop {
            match monitor(&sender, debug_enabled) {
                Ok(()) => {
                    if debug_enabled {
                        log_pipe!();
                        log_debug!("{name} thread exiting normally");
                    }
                    return;
                }
                Err(e) => {
                    log_pipe!();
                    log_warning!("{name} error: {e}");
                    if attempt >= MAX_MONITOR_RESTARTS {
                        log_indented!("Maximum restart attempts reached");
                        log_indented!("Lock/unlock and sleep triggers will not be available");
                        return;
                    }
                    attempt += 1;
                    log_indented!(
                        "Will restart D-Bus monitor (attempt {attempt}/{MAX_MONITOR_RESTARTS})"
                    );
                    thread::sleep(Duration::from_millis(RESTART_DELAY_MS));
                }
            }
        }
    });
}

fn monitor_sleep_signals(sender: &Sender<Event>, debug_enabled: bool) -> Result<()> {
    let connection = Connection::system().context("Failed to connect to system D-Bus")?;
    let proxy =
        LogindManagerProxyBlocking::new(&connection).context("Failed to create logind proxy")?;
    let sleep_signals = proxy
        .receive_prepare_for_sleep()
        .context("Failed to subscribe to PrepareForSleep signals")?;

    if debug_enabled {
        log_debug!("Subscribed to systemd-logind PrepareForSleep signals");
    }

    for signal in sleep_signals {
        let going_to_sleep = match signal.args() {
            Ok(args) => args.start,
            Err(e) => {
                log_pipe!();
                log_warning!("Failed to parse PrepareForSleep signal args: {e}");
                continue;
            }
        };

        log_pipe!();
        if going_to_sleep {
            log_info!("System entering sleep/suspend mode");
        } else {
            log_info!("System resuming from sleep/suspend");
        }
        if sender.send(event_for_sleep(going_to_sleep)).is_err() {
            return Ok(());
        }
    }

    anyhow::bail!("D-Bus connection lost - PrepareForSleep signal stream ended")
}

fn monitor_session_signals(sender: &Sender<Event>, debug_enabled: bool) -> Result<()> {
    let connection = Connection::system().context("Failed to connect to system D-Bus")?;
    let proxy = LogindSessionProxyBlocking::new(&connection)
        .context("Failed to create logind session proxy")?;
    let lock_signals = proxy
        .receive_lock()
        .context("Failed to subscribe to session Lock signals")?;
    let unlock_signals = proxy
        .receive_unlock()
        .context("Failed to subscribe to session Unlock signals")?;

    if debug_enabled {
        log_debug!("Subscribed to systemd-logind session Lock/Unlock signals");
    }

    // Lock events only pre-arm the next wake, so they get their own thread
    let lock_sender = sender.clone();
    thread::spawn(move || {
        for _ in lock_signals {
            if lock_sender.send(Event::ScreenOff).is_err() {
                return;
            }
        }
    });

    for _ in unlock_signals {
        log_pipe!();
        log_info!("Session unlocked");
        if sender.send(Event::Wake).is_err() {
            return Ok(());
        }
    }

    anyhow::bail!("D-Bus connection lost - session Unlock signal stream ended")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_payload_mapping() {
        assert_eq!(event_for_sleep(true), Event::ScreenOff);
        assert_eq!(event_for_sleep(false), Event::Wake);
    }
}
