//! Main application entry point.
//!
//! Parses the command line and dispatches to the daemon or to a one-shot command. All
//! logic lives in the library; this file only maps `CliAction` variants to calls.

use anyhow::Result;
use autolight::{
    Autolight,
    args::{self, CliAction, ParsedArgs},
    commands, config,
    common::constants::EXIT_FAILURE,
    log_end, log_error_exit, log_pipe, log_warning,
};

fn main() -> Result<()> {
    let parsed_args = ParsedArgs::from_env();

    match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Help { command } => commands::help::run_help_command(command.as_deref()),
        CliAction::Run {
            debug_enabled,
            config_dir,
        } => {
            set_config_dir(config_dir);
            Autolight::new(debug_enabled).run()
        }
        CliAction::Curve {
            lux_values,
            config_dir,
        } => {
            set_config_dir(config_dir);
            report_failure(commands::curve::handle_curve_command(&lux_values))
        }
        CliAction::Simulate {
            debug_enabled,
            trace_path,
            config_dir,
        } => {
            set_config_dir(config_dir);
            report_failure(commands::simulate::handle_simulate_command(
                &trace_path,
                debug_enabled,
            ))
        }
    }
}

fn set_config_dir(config_dir: Option<String>) {
    if let Err(e) = config::set_config_dir(config_dir) {
        log_pipe!();
        log_warning!("{e}");
    }
}

// One-shot commands print their own error block and exit non-zero
fn report_failure(result: Result<()>) -> Result<()> {
    if let Err(e) = result {
        log_error_exit!("{e:#}");
        log_end!();
        std::process::exit(EXIT_FAILURE);
    }
    Ok(())
}
