//! Unix signal handling.
//!
//! A dedicated thread turns signals into [`Event`]s on the core channel:
//!
//! - `SIGINT`, `SIGTERM`, `SIGHUP`: graceful shutdown
//! - `SIGUSR1`: unlock/screen-on trigger (for lock screen hooks)
//! - `SIGUSR2`: configuration reload

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    sync::mpsc::{Receiver, Sender},
    thread,
};

use crate::io::events::Event;

/// Channel and running flag shared between the core loop and collaborator threads.
pub struct SignalState {
    /// Cleared once a shutdown has been requested
    pub running: Arc<AtomicBool>,
    /// Receiving end consumed by the core loop
    pub event_receiver: Receiver<Event>,
    /// Sending end cloned into every collaborator thread
    pub event_sender: Sender<Event>,
}

impl SignalState {
    /// Channel and running flag without any signal thread (simulation, tests).
    pub fn detached() -> Self {
        let (event_sender, event_receiver) = std::sync::mpsc::channel::<Event>();
        Self {
            running: Arc::new(AtomicBool::new(true)),
            event_receiver,
            event_sender,
        }
    }
}

/// Map a received signal to the event it requests.
pub fn event_for_signal(sig: i32) -> Option<Event> {
    match sig {
        SIGINT | SIGTERM | SIGHUP => Some(Event::Shutdown),
        SIGUSR1 => Some(Event::Wake),
        SIGUSR2 => Some(Event::Reload),
        _ => None,
    }
}

/// Register signal handlers and spawn the forwarding thread.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let state = SignalState::detached();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running = state.running.clone();
    let sender = state.event_sender.clone();

    thread::spawn(move || {
        for sig in signals.forever() {
            let Some(event) = event_for_signal(sig) else {
                continue;
            };

            log_pipe!();
            match sig {
                SIGINT if debug_enabled => {
                    log_info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...")
                }
                SIGINT => log_info!("Received interrupt signal, initiating graceful shutdown..."),
                SIGTERM => {
                    log_info!("Received termination request, initiating graceful shutdown...")
                }
                SIGHUP => log_info!("Received hangup signal, initiating graceful shutdown..."),
                SIGUSR1 => log_info!("Received wake signal"),
                _ => log_info!("Received configuration reload signal"),
            }

            if event == Event::Shutdown {
                running.store(false, Ordering::SeqCst);
            }

            if sender.send(event).is_err() {
                // Core loop is gone
                break;
            }
            if event == Event::Shutdown {
                break;
            }
        }
    });

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_mapping() {
        assert_eq!(event_for_signal(SIGINT), Some(Event::Shutdown));
        assert_eq!(event_for_signal(SIGTERM), Some(Event::Shutdown));
        assert_eq!(event_for_signal(SIGHUP), Some(Event::Shutdown));
        assert_eq!(event_for_signal(SIGUSR1), Some(Event::Wake));
        assert_eq!(event_for_signal(SIGUSR2), Some(Event::Reload));
        assert_eq!(event_for_signal(0), None);
    }

    #[test]
    fn test_detached_state_delivers_events() {
        let state = SignalState::detached();
        state.event_sender.send(Event::Reload).unwrap();
        assert_eq!(state.event_receiver.recv().unwrap(), Event::Reload);
        assert!(state.running.load(Ordering::SeqCst));
    }
}
