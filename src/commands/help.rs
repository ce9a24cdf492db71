//! `nightfall help [command]` and `nightfall <command> --help`.

use anyhow::Result;

struct CommandEntry {
    name: &'static str,
    alias: &'static str,
    synopsis: &'static str,
    summary: &'static str,
    usage: fn(),
    help: fn(),
}

const COMMANDS: &[CommandEntry] = &[
    CommandEntry {
        name: "get",
        alias: "g",
        synopsis: "<field>...",
        summary: "Read configuration field(s)",
        usage: super::get::show_usage,
        help: super::get::display_help,
    },
    CommandEntry {
        name: "help",
        alias: "h",
        synopsis: "[COMMAND]",
        summary: "Show detailed help for a command",
        usage: display_help_help,
        help: display_help_help,
    },
    CommandEntry {
        name: "reload",
        alias: "r",
        synopsis: "",
        summary: "Reload the running instance's configuration",
        usage: super::reload::show_usage,
        help: super::reload::display_help,
    },
    CommandEntry {
        name: "set",
        alias: "s",
        synopsis: "<field>=<value>...",
        summary: "Update configuration field(s)",
        usage: super::set::show_usage,
        help: super::set::display_help,
    },
    CommandEntry {
        name: "status",
        alias: "S",
        synopsis: "",
        summary: "Show the nighttime window and current state",
        usage: super::status::show_usage,
        help: super::status::display_help,
    },
    CommandEntry {
        name: "stop",
        alias: "x",
        synopsis: "",
        summary: "Stop the running instance",
        usage: super::stop::show_usage,
        help: super::stop::display_help,
    },
];

fn lookup(command: &str) -> Option<&'static CommandEntry> {
    COMMANDS
        .iter()
        .find(|entry| entry.name == command || entry.alias == command)
}

/// Brief usage for `nightfall <command> --help`.
pub fn show_command_usage(command: &str) {
    match lookup(command) {
        Some(entry) => (entry.usage)(),
        None => display_help_help(),
    }
}

pub fn run_help_command(command: Option<&str>) -> Result<()> {
    let Some(command) = command else {
        display_general_help();
        return Ok(());
    };

    match lookup(command) {
        Some(entry) => (entry.help)(),
        None => {
            log_warning_standalone!("Unknown command: {command}");
            display_general_help();
        }
    }
    Ok(())
}

fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    for entry in COMMANDS {
        let invocation = format!("{}, {} {}", entry.name, entry.alias, entry.synopsis);
        log_indented!("{:<28}{}", invocation.trim_end(), entry.summary);
    }
    log_pipe!();
    log_info!("Run 'nightfall help <command>' for the options of one command.");
    log_indented!("Run 'nightfall --help' for the global flags.");
    log_end!();
}

fn display_help_help() {
    log_version!();
    log_block_start!("help - Describe a command");
    log_block_start!("Usage: nightfall help [COMMAND]");
    log_indented!("COMMAND may be a full name or its one-letter alias.");
    log_indented!("Without it, every command is listed.");
    log_block_start!("Examples:");
    log_indented!("nightfall help");
    log_indented!("nightfall help set");
    log_indented!("nightfall h S");
    log_end!();
}
