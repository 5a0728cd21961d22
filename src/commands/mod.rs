//! Command-line command handlers for autolight.
//!
//! Each one-shot command lives in its own submodule and returns to `main` when done;
//! none of them touch a running daemon.

pub mod curve;
pub mod help;
pub mod simulate;
