//! Structured logging system with visual formatting.
//!
//! autolight logs in a box-drawing style: every line hangs off a vertical pipe so that
//! a long-running daemon session reads as one continuous block of related events.
//!
//! ## Logging Conventions
//!
//! - **`log_block_start!`**: begins a new conceptual block (config loaded, sampling
//!   started, shutdown). Prints an empty `┃` spacer and then `┣ message`.
//! - **`log_decorated!`**: a line inside the current block, `┣ message`.
//! - **`log_indented!`**: nested details of the previous line, `┃   message`.
//! - **`log_pipe!`**: a bare `┃` spacer. Use it before a semantic message
//!   (`log_warning!`, `log_info!`, ...) that opens a block of its own.
//! - **`log_version!`** / **`log_end!`**: the header and the terminal `╹` marker.
//! - **`log_info!`, `log_warning!`, `log_error!`, `log_debug!`**:
//!   semantic messages with a colored `[LEVEL]` tag.
//!
//! Logging can be switched off at runtime for quiet operation (tests, piping the output
//! of `autolight curve`), and a wall-clock prefix can be enabled for debug sessions.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static TIMESTAMPS_ENABLED: AtomicBool = AtomicBool::new(false);

/// Shape of a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Decorated,
    Indented,
    Pipe,
    BlockStart,
    Version,
    End,
    Info,
    Debug,
    Warning,
    WarningStandalone,
    Error,
    ErrorExit,
}

/// Main logging interface.
pub struct Log;

impl Log {
    /// Enable or disable logging.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Prefix every line with the local wall-clock time (used with `--debug`).
    pub fn set_timestamps(enabled: bool) {
        TIMESTAMPS_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Timestamp prefix for the current line, or an empty string.
    pub fn get_timestamp_prefix() -> String {
        if TIMESTAMPS_ENABLED.load(Ordering::SeqCst) {
            format!("[{}] ", chrono::Local::now().format("%H:%M:%S%.3f"))
        } else {
            String::new()
        }
    }
}

/// Render one message in the given line shape, without the trailing newline handling.
pub fn format_line(line: Line, prefix: &str, message: &str) -> String {
    match line {
        Line::Decorated => format!("{prefix}┣ {message}\n"),
        Line::Indented => format!("{prefix}┃   {message}\n"),
        Line::Pipe => format!("{prefix}┃\n"),
        Line::BlockStart => format!("{prefix}┃\n{prefix}┣ {message}\n"),
        Line::Version => format!("{prefix}┏ {message} ━━╸\n"),
        Line::End => format!("{prefix}╹\n"),
        Line::Info => format!("{prefix}┣[\x1b[32mINFO\x1b[0m] {message}\n"),
        Line::Debug => format!("{prefix}┣[\x1b[32mDEBUG\x1b[0m] {message}\n"),
        Line::Warning => format!("{prefix}┣[\x1b[33mWARNING\x1b[0m] {message}\n"),
        Line::WarningStandalone => format!("{prefix}[\x1b[33mWARNING\x1b[0m] {message}\n"),
        Line::Error => format!("{prefix}┣[\x1b[31mERROR\x1b[0m] {message}\n"),
        Line::ErrorExit => format!("{prefix}┃\n{prefix}┗[\x1b[31mERROR\x1b[0m] {message}\n"),
    }
}

/// Format and write one line if logging is enabled (needed by macros).
pub fn emit(line: Line, message: &str) {
    if !Log::is_enabled() {
        return;
    }
    let prefix = Log::get_timestamp_prefix();
    write_output(&format_line(line, &prefix, message));
}

// Public function that routes output (needed by macros)
pub fn write_output(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

// # Logging Macros
//
// Every macro accepts either a format string with arguments or a single expression
// implementing Display, mirroring `format!`.

/// Internal dispatcher shared by the public logging macros.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($line:expr; $fmt:literal $($arg:tt)*) => {{
        if $crate::common::logger::Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::common::logger::emit($line, &message);
        }
    }};
    ($line:expr; $expr:expr) => {{
        if $crate::common::logger::Log::is_enabled() {
            let message = format!("{}", $expr);
            $crate::common::logger::emit($line, &message);
        }
    }};
}

/// Log a decorated message, typically as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => { $crate::__log_line!($crate::common::logger::Line::Decorated; $($arg)+) };
}

/// Log an indented message for sub-items or details within a block.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => { $crate::__log_line!($crate::common::logger::Line::Indented; $($arg)+) };
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::common::logger::emit($crate::common::logger::Line::Pipe, "")
    };
}

/// Log a block start message, initiating a new conceptual block of information.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => { $crate::__log_line!($crate::common::logger::Line::BlockStart; $($arg)+) };
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::common::logger::emit(
            $crate::common::logger::Line::Version,
            concat!("autolight v", env!("CARGO_PKG_VERSION")),
        )
    };
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {
        $crate::common::logger::emit($crate::common::logger::Line::End, "")
    };
}

/// Log an informational message with pipe prefix and green-colored tag.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => { $crate::__log_line!($crate::common::logger::Line::Info; $($arg)+) };
}

/// Log a debug/operational message with pipe prefix and green-colored tag.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => { $crate::__log_line!($crate::common::logger::Line::Debug; $($arg)+) };
}

/// Log a warning message with pipe prefix and yellow-colored tag.
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => { $crate::__log_line!($crate::common::logger::Line::Warning; $($arg)+) };
}

/// Log a warning without the pipe prefix (used outside of a block, e.g. argument errors).
#[macro_export]
macro_rules! log_warning_standalone {
    ($($arg:tt)+) => {
        $crate::__log_line!($crate::common::logger::Line::WarningStandalone; $($arg)+)
    };
}

/// Log an error message with pipe prefix and red-colored tag.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => { $crate::__log_line!($crate::common::logger::Line::Error; $($arg)+) };
}

/// Log an error that terminates the current flow, closing the block with `┗`.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => { $crate::__log_line!($crate::common::logger::Line::ErrorExit; $($arg)+) };
}
