//! Command-line argument parsing and processing.
//!
//! Global flags (`--debug`, `--config <dir>`, `--log <file>`) may appear
//! anywhere; the first non-flag argument selects a command. Without a
//! command nightfall runs the daemon.

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        log_file: Option<String>,
    },
    /// Print the configured window and whether it is night
    StatusCommand {
        config_dir: Option<String>,
        json: bool,
        at: Option<String>,
    },
    /// Ask the running instance to reload its configuration
    ReloadCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Terminate the running instance
    StopCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Read settings
    GetCommand {
        config_dir: Option<String>,
        fields: Vec<String>,
        json: bool,
    },
    /// Write settings
    SetCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
        fields: Vec<(String, String)>,
    },
    /// `nightfall help [command]`
    HelpCommand { command: Option<String> },
    /// `nightfall <command> --help`
    ShowCommandUsage { command: String },

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

const COMMANDS: [&str; 12] = [
    "status", "S", "reload", "r", "stop", "x", "get", "g", "set", "s", "help", "h",
];

fn canonical_command(command: &str) -> Option<&'static str> {
    match command {
        "status" | "S" => Some("status"),
        "reload" | "r" => Some("reload"),
        "stop" | "x" => Some("stop"),
        "get" | "g" => Some("get"),
        "set" | "s" => Some("set"),
        "help" | "h" => Some("help"),
        _ => None,
    }
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// The first item is the program name and is skipped.
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
        let mut json = false;
        let mut unknown_arg_found = false;
        let mut config_dir: Option<String> = None;
        let mut log_file: Option<String> = None;
        let mut at: Option<String> = None;
        let mut positional: Vec<String> = Vec::new();

        let mut i = 0;
        while i < args_vec.len() {
            let arg = args_vec[i].as_str();
            match arg {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--json" | "-j" => json = true,
                "--config" | "-c" | "--log" | "-l" | "--at" => {
                    match args_vec.get(i + 1).filter(|next| !next.starts_with('-')) {
                        Some(value) => {
                            let slot = match arg {
                                "--config" | "-c" => &mut config_dir,
                                "--log" | "-l" => &mut log_file,
                                _ => &mut at,
                            };
                            *slot = Some(value.clone());
                            i += 1;
                        }
                        None => {
                            log_warning!("Missing value for {arg}");
                            unknown_arg_found = true;
                        }
                    }
                }
                _ if arg.starts_with('-') && positional.is_empty() => {
                    log_warning!("Unknown option: {arg}");
                    unknown_arg_found = true;
                }
                _ => positional.push(args_vec[i].clone()),
            }
            i += 1;
        }

        if display_version {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }

        let Some(command) = positional.first() else {
            let action = if unknown_arg_found {
                CliAction::ShowHelpDueToError
            } else if display_help {
                CliAction::ShowHelp
            } else {
                CliAction::Run {
                    debug_enabled,
                    config_dir,
                    log_file,
                }
            };
            return ParsedArgs { action };
        };

        let Some(command) = canonical_command(command) else {
            log_warning!("Unknown command: {}", command);
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        };

        if display_help && command != "help" {
            return ParsedArgs {
                action: CliAction::ShowCommandUsage {
                    command: command.to_string(),
                },
            };
        }
        if unknown_arg_found {
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        let rest = &positional[1..];
        let takes_no_arguments = matches!(command, "status" | "reload" | "stop");
        if takes_no_arguments && let Some(extra) = rest.first() {
            if COMMANDS.contains(&extra.as_str()) {
                log_error!("Cannot use multiple commands at once: '{}' and '{}'", command, extra);
            } else {
                log_warning!("Unexpected argument for {}: {}", command, extra);
            }
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        let action = match command {
            "status" => CliAction::StatusCommand {
                config_dir,
                json,
                at,
            },
            "reload" => CliAction::ReloadCommand {
                debug_enabled,
                config_dir,
            },
            "stop" => CliAction::StopCommand {
                debug_enabled,
                config_dir,
            },
            "get" => {
                if rest.is_empty() {
                    log_warning!("Missing field. Usage: nightfall get <field> [<field>...]");
                    CliAction::ShowHelpDueToError
                } else {
                    CliAction::GetCommand {
                        config_dir,
                        fields: rest.to_vec(),
                        json,
                    }
                }
            }
            "set" => match parse_assignments(rest) {
                Some(fields) => CliAction::SetCommand {
                    debug_enabled,
                    config_dir,
                    fields,
                },
                None => {
                    log_warning!(
                        "Missing field or value. Usage: nightfall set <field>=<value> [<field>=<value>...]"
                    );
                    log_indented!("Example: nightfall set night-theme=Adwaita-dark");
                    CliAction::ShowHelpDueToError
                }
            },
            _ => CliAction::HelpCommand {
                command: rest.first().cloned(),
            },
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Split `field=value` arguments. `None` if any is malformed or none given.
fn parse_assignments(args: &[String]) -> Option<Vec<(String, String)>> {
    if args.is_empty() {
        return None;
    }
    args.iter()
        .map(|arg| {
            let (field, value) = arg.split_once('=')?;
            let field = field.trim();
            if field.is_empty() {
                return None;
            }
            Some((field.to_string(), value.to_string()))
        })
        .collect()
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
    log_block_start!("{}", env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("nightfall [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-l, --log <file>       Also write the log to a file");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("status, S              Show the nighttime window and current state");
    log_indented!("reload, r              Reload the running instance's configuration");
    log_indented!("stop, x                Stop the running instance");
    log_indented!("get, g <field>         Read setting(s)");
    log_indented!("set, s <field>=<value> Update setting(s)");
    log_indented!("help, h [COMMAND]      Show detailed help for a command");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliAction {
        let mut full = vec!["nightfall"];
        full.extend_from_slice(args);
        ParsedArgs::parse(full).action
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(
            parse(&[]),
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
                log_file: None,
            }
        );
    }

    #[test]
    fn test_parse_run_flags() {
        assert_eq!(
            parse(&["-d", "--config", "/tmp/nf", "--log", "/tmp/nf.log"]),
            CliAction::Run {
                debug_enabled: true,
                config_dir: Some("/tmp/nf".to_string()),
                log_file: Some("/tmp/nf.log".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_help_and_version() {
        assert_eq!(parse(&["--help"]), CliAction::ShowHelp);
        assert_eq!(parse(&["-V"]), CliAction::ShowVersion);
        assert_eq!(parse(&["--help", "--version"]), CliAction::ShowVersion);
    }

    #[test]
    fn test_parse_unknown_flag() {
        assert_eq!(parse(&["--sunset"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["--config"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(
            parse(&["status", "--json", "--at", "22:30"]),
            CliAction::StatusCommand {
                config_dir: None,
                json: true,
                at: Some("22:30".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_command_aliases() {
        assert_eq!(
            parse(&["r", "-d"]),
            CliAction::ReloadCommand {
                debug_enabled: true,
                config_dir: None,
            }
        );
        assert_eq!(
            parse(&["x"]),
            CliAction::StopCommand {
                debug_enabled: false,
                config_dir: None,
            }
        );
    }

    #[test]
    fn test_parse_multiple_commands() {
        assert_eq!(parse(&["reload", "stop"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_get() {
        assert_eq!(
            parse(&["get", "day-theme", "night-theme", "-j"]),
            CliAction::GetCommand {
                config_dir: None,
                fields: vec!["day-theme".to_string(), "night-theme".to_string()],
                json: true,
            }
        );
        assert_eq!(parse(&["get"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(
            parse(&["set", "night-theme=Adwaita-dark", "day-command=echo a=b"]),
            CliAction::SetCommand {
                debug_enabled: false,
                config_dir: None,
                fields: vec![
                    ("night-theme".to_string(), "Adwaita-dark".to_string()),
                    ("day-command".to_string(), "echo a=b".to_string()),
                ],
            }
        );
        assert_eq!(parse(&["set", "night-theme"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["set"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_set_value_may_start_with_dash() {
        assert_eq!(
            parse(&["set", "day-command=-x"]),
            CliAction::SetCommand {
                debug_enabled: false,
                config_dir: None,
                fields: vec![("day-command".to_string(), "-x".to_string())],
            }
        );
    }

    #[test]
    fn test_parse_help_command() {
        assert_eq!(
            parse(&["help", "set"]),
            CliAction::HelpCommand {
                command: Some("set".to_string()),
            }
        );
        assert_eq!(
            parse(&["set", "--help"]),
            CliAction::ShowCommandUsage {
                command: "set".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(parse(&["geo"]), CliAction::ShowHelpDueToError);
    }
}
