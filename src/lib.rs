//! # autolight library
//!
//! Internal library for the autolight binary: an adaptive screen brightness daemon that
//! maps ambient light readings to backlight levels.
//!
//! This library exists to enable testing of the engine and to keep CLI dispatch
//! (main.rs) separate from application logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Autolight` builder loads configuration, opens devices and runs the
//!   core loop
//! - **Core Logic**: `core` holds the brightness pipeline (`curve`, `smoothing`,
//!   `hysteresis`, `activation`, `engine`) and the `Core` event loop
//! - **Configuration**: `config` module for TOML-based settings with hot-reload
//! - **Collaborators**: `io` module with the light sensor, backlight, Unix signals and
//!   logind monitoring, all feeding one event channel
//! - **Commands**: `commands` module for the `curve`, `simulate` and `help` subcommands
//! - **Infrastructure**: logging, constants and a monotonic clock abstraction

// Logger macros must be declared first so every later module can use them
#[macro_use]
pub mod common;

pub mod args;
pub mod commands;
pub mod config;
pub mod core;
pub mod io;
pub mod time_source;

mod autolight;

pub use autolight::Autolight;
