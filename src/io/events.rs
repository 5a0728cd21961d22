//! Events delivered to the core loop by the external collaborators.
//!
//! Every collaborator thread (signals, D-Bus, sensor poller, stdin, config watcher)
//! only ever sends [`Event`] values over one channel. The textual form parsed here is
//! shared by the stdin source and by `autolight simulate` trace files.

use anyhow::{Context, Result};

/// One external trigger for the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Raw ambient light reading in lux (stamped by the receiver's clock)
    Light { lux: f64 },
    /// Device orientation changed
    Orientation { landscape: bool },
    /// Session unlocked or screen switched on
    Wake,
    /// Screen switched off or session locked
    ScreenOff,
    /// Configuration should be re-read
    Reload,
    /// Stop the daemon
    Shutdown,
}

impl Event {
    pub fn describe(&self) -> String {
        match self {
            Event::Light { lux } => format!("light {lux} lux"),
            Event::Orientation { landscape: true } => "orientation landscape".to_string(),
            Event::Orientation { landscape: false } => "orientation portrait".to_string(),
            Event::Wake => "unlock/screen-on".to_string(),
            Event::ScreenOff => "screen-off".to_string(),
            Event::Reload => "reload".to_string(),
            Event::Shutdown => "shutdown".to_string(),
        }
    }
}

/// Parse one event description such as `lux 230.5`, `230.5`, `landscape` or `unlock`.
pub fn parse_event(text: &str) -> Result<Event> {
    let mut words = text.split_whitespace();
    let Some(keyword) = words.next() else {
        anyhow::bail!("empty event");
    };
    let argument = words.next();
    if let Some(extra) = words.next() {
        anyhow::bail!("unexpected trailing input '{extra}' in event '{text}'");
    }

    let event = match (keyword.to_ascii_lowercase().as_str(), argument) {
        ("lux" | "light", Some(value)) => Event::Light {
            lux: parse_lux(value)?,
        },
        ("lux" | "light", None) => anyhow::bail!("'{keyword}' needs a lux value"),
        ("landscape", None) => Event::Orientation { landscape: true },
        ("portrait", None) => Event::Orientation { landscape: false },
        ("unlock" | "screen-on" | "wake", None) => Event::Wake,
        ("screen-off" | "lock", None) => Event::ScreenOff,
        ("reload", None) => Event::Reload,
        ("quit" | "shutdown", None) => Event::Shutdown,
        (_, None) => match keyword.parse::<f64>() {
            Ok(_) => Event::Light {
                lux: parse_lux(keyword)?,
            },
            Err(_) => anyhow::bail!("unknown event '{keyword}'"),
        },
        (_, Some(_)) => anyhow::bail!("unknown event '{text}'"),
    };
    Ok(event)
}

// Negative readings are passed through; the engine drops them as invalid samples
fn parse_lux(value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .with_context(|| format!("invalid lux value '{value}'"))
}

/// Parse one trace line `<t_ms> <event>`. Blank lines and `#` comments yield `None`.
pub fn parse_trace_line(line: &str) -> Result<Option<(i64, Event)>> {
    let line = line.split('#').next().unwrap_or_default().trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (time, rest) = line
        .split_once(char::is_whitespace)
        .with_context(|| format!("expected '<t_ms> <event>', got '{line}'"))?;
    let timestamp_ms = time
        .parse::<i64>()
        .with_context(|| format!("invalid timestamp '{time}'"))?;
    let event = parse_event(rest)?;
    Ok(Some((timestamp_ms, event)))
}
