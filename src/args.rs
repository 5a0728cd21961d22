//! Command-line argument parsing and processing.
//!
//! Supports the global `--debug`, `--config`, `--help` and `--version` flags, plus the
//! `curve`, `simulate` and `help` subcommands. Unknown options fall back to the help
//! screen instead of aborting with a parser error.

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon with these settings
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Print the configured curve's brightness for each lux value
    Curve {
        lux_values: Vec<f64>,
        config_dir: Option<String>,
    },
    /// Replay a timestamped event trace through a fresh engine
    Simulate {
        debug_enabled: bool,
        trace_path: String,
        config_dir: Option<String>,
    },
    /// Show help for one command (or the overview when `None`)
    Help { command: Option<String> },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// The first element is the program name and is skipped. Flags may appear before or
    /// after the subcommand.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut unknown_arg_found = false;
        let mut config_dir: Option<String> = None;
        let mut positionals: Vec<String> = Vec::new();

        let mut i = 0;
        while i < args_vec.len() {
            let arg = args_vec[i].as_str();
            match arg {
                "--debug" | "-d" => debug_enabled = true,
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--config" | "-c" => {
                    if let Some(dir) = args_vec.get(i + 1).filter(|next| !next.starts_with('-'))
                    {
                        config_dir = Some(dir.clone());
                        i += 1;
                    } else {
                        log_warning!("Missing directory for --config. Usage: --config <dir>");
                        unknown_arg_found = true;
                    }
                }
                // Negative numbers are lux values, not options
                _ if arg.starts_with('-') && arg.parse::<f64>().is_err() => {
                    log_warning!("Unknown option: {arg}");
                    unknown_arg_found = true;
                }
                _ => positionals.push(arg.to_string()),
            }
            i += 1;
        }

        // Version and help take precedence over everything else
        if display_version {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if display_help {
            return ParsedArgs {
                action: CliAction::ShowHelp,
            };
        }
        if unknown_arg_found {
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        let Some((command, rest)) = positionals.split_first() else {
            return ParsedArgs {
                action: CliAction::Run {
                    debug_enabled,
                    config_dir,
                },
            };
        };

        let action = match command.as_str() {
            "curve" | "c" => parse_curve_args(rest, config_dir),
            "simulate" | "S" => match rest {
                [trace_path] => CliAction::Simulate {
                    debug_enabled,
                    trace_path: trace_path.clone(),
                    config_dir,
                },
                _ => {
                    log_warning!("Usage: autolight simulate <trace-file>");
                    CliAction::ShowHelpDueToError
                }
            },
            "help" => match rest {
                [] => CliAction::Help { command: None },
                [topic] => CliAction::Help {
                    command: Some(topic.clone()),
                },
                _ => {
                    log_warning!("Usage: autolight help [command]");
                    CliAction::ShowHelpDueToError
                }
            },
            other => {
                log_warning!("Unknown command: {other}");
                CliAction::ShowHelpDueToError
            }
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

fn parse_curve_args(values: &[String], config_dir: Option<String>) -> CliAction {
    if values.is_empty() {
        log_warning!("Missing lux values. Usage: autolight curve <lux> [<lux>...]");
        return CliAction::ShowHelpDueToError;
    }

    let mut lux_values = Vec::with_capacity(values.len());
    for value in values {
        match value.parse::<f64>() {
            Ok(lux) if lux.is_finite() => lux_values.push(lux),
            _ => {
                log_warning!("Invalid lux value: '{value}'");
                return CliAction::ShowHelpDueToError;
            }
        }
    }

    CliAction::Curve {
        lux_values,
        config_dir,
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("autolight [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("curve, c <lux>...      Print the configured brightness for lux values");
    log_indented!("simulate, S <trace>    Replay a timestamped event trace");
    log_indented!("help [command]         Show detailed help for a command");
    log_block_start!("Signals:");
    log_indented!("SIGUSR1                Apply the next reading immediately (unlock)");
    log_indented!("SIGUSR2                Reload configuration");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_args() {
        let parsed = ParsedArgs::parse(vec!["autolight"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
            }
        );
    }

    #[test]
    fn test_parse_debug_flag() {
        for flag in ["--debug", "-d"] {
            let parsed = ParsedArgs::parse(vec!["autolight", flag]);
            assert_eq!(
                parsed.action,
                CliAction::Run {
                    debug_enabled: true,
                    config_dir: None,
                }
            );
        }
    }

    #[test]
    fn test_parse_config_dir() {
        let parsed = ParsedArgs::parse(vec!["autolight", "-c", "/tmp/conf", "--debug"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: true,
                config_dir: Some("/tmp/conf".to_string()),
            }
        );

        let parsed = ParsedArgs::parse(vec!["autolight", "--config"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_help_and_version() {
        assert_eq!(
            ParsedArgs::parse(vec!["autolight", "--help"]).action,
            CliAction::ShowHelp
        );
        assert_eq!(
            ParsedArgs::parse(vec!["autolight", "-h"]).action,
            CliAction::ShowHelp
        );
        assert_eq!(
            ParsedArgs::parse(vec!["autolight", "-V"]).action,
            CliAction::ShowVersion
        );
        assert_eq!(
            ParsedArgs::parse(vec!["autolight", "-v"]).action,
            CliAction::ShowVersion
        );
    }

    #[test]
    fn test_version_takes_precedence() {
        let parsed = ParsedArgs::parse(vec!["autolight", "--version", "--help", "--debug"]);
        assert_eq!(parsed.action, CliAction::ShowVersion);
    }

    #[test]
    fn test_parse_unknown_flag() {
        let parsed = ParsedArgs::parse(vec!["autolight", "--debug", "--invalid"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_curve_command() {
        let parsed = ParsedArgs::parse(vec!["autolight", "curve", "5", "100", "2500.5"]);
        assert_eq!(
            parsed.action,
            CliAction::Curve {
                lux_values: vec![5.0, 100.0, 2500.5],
                config_dir: None,
            }
        );
    }

    #[test]
    fn test_parse_curve_accepts_negative_lux() {
        let parsed = ParsedArgs::parse(vec!["autolight", "c", "-3", "--config", "/etc/al"]);
        assert_eq!(
            parsed.action,
            CliAction::Curve {
                lux_values: vec![-3.0],
                config_dir: Some("/etc/al".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_curve_rejects_bad_values() {
        assert_eq!(
            ParsedArgs::parse(vec!["autolight", "curve"]).action,
            CliAction::ShowHelpDueToError
        );
        assert_eq!(
            ParsedArgs::parse(vec!["autolight", "curve", "bright"]).action,
            CliAction::ShowHelpDueToError
        );
        assert_eq!(
            ParsedArgs::parse(vec!["autolight", "curve", "inf"]).action,
            CliAction::ShowHelpDueToError
        );
    }

    #[test]
    fn test_parse_simulate_command() {
        let parsed = ParsedArgs::parse(vec!["autolight", "-d", "simulate", "trace.txt"]);
        assert_eq!(
            parsed.action,
            CliAction::Simulate {
                debug_enabled: true,
                trace_path: "trace.txt".to_string(),
                config_dir: None,
            }
        );

        let parsed = ParsedArgs::parse(vec!["autolight", "simulate"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_help_command() {
        assert_eq!(
            ParsedArgs::parse(vec!["autolight", "help"]).action,
            CliAction::Help { command: None }
        );
        assert_eq!(
            ParsedArgs::parse(vec!["autolight", "help", "simulate"]).action,
            CliAction::Help {
                command: Some("simulate".to_string())
            }
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        let parsed = ParsedArgs::parse(vec!["autolight", "dance"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }
}
