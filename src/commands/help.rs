//! Help command implementation for autolight.
//!
//! Dispatches to the command-specific help screens or shows the command overview.

use anyhow::Result;

/// Show brief usage for a command (used for error messages)
pub fn show_command_usage(command: &str) {
    match command {
        "curve" | "c" => log_block_start!("Usage: autolight curve <lux> [<lux>...]"),
        "simulate" | "S" => log_block_start!("Usage: autolight simulate <trace-file>"),
        _ => log_block_start!("Usage: autolight [OPTIONS] [COMMAND]"),
    }
}

/// Run the help command (dispatcher)
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("curve") | Some("c") => super::curve::display_help(),
        Some("simulate") | Some("S") => super::simulate::display_help(),
        Some("help") | Some("h") => display_help_help(),
        Some(unknown) => {
            log_warning_standalone!("Unknown command: {}", unknown);
            display_general_help();
        }
    }
    Ok(())
}

fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("curve, c <lux>...       Print the configured brightness for lux values");
    log_indented!("simulate, S <trace>     Replay a timestamped event trace");
    log_indented!("help, h [COMMAND]       Show detailed help for a command");
    log_pipe!();
    log_info!("Use 'autolight help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'autolight --help' to see all options and general usage.");
    log_end!();
}

fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: autolight help [COMMAND]");
    log_block_start!("Arguments:");
    log_indented!("COMMAND  Optional command to get help for");
    log_indented!("         If omitted, shows general help");
    log_block_start!("Examples:");
    log_indented!("# Show general help");
    log_indented!("autolight help");
    log_pipe!();
    log_indented!("# Show help for specific commands");
    log_indented!("autolight help curve");
    log_indented!("autolight help simulate");
    log_end!();
}
