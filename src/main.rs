//! Main application entry point.
//!
//! Parses the command line and hands over to the daemon (`Nightfall`) or
//! one of the one-shot commands.

use anyhow::Result;

#[macro_use]
extern crate nightfall;

use nightfall::{
    Nightfall,
    args::{self, CliAction, ParsedArgs},
    commands,
    common::{constants::EXIT_FAILURE, logger::Log},
    config,
};

fn main() {
    let parsed = ParsedArgs::from_env();

    if let Err(e) = dispatch(parsed.action) {
        log_error_exit!("{:#}", e);
        std::process::exit(EXIT_FAILURE);
    }
}

fn dispatch(action: CliAction) -> Result<()> {
    match action {
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
        CliAction::HelpCommand { command } => commands::help::run_help_command(command.as_deref()),
        CliAction::ShowCommandUsage { command } => {
            commands::help::show_command_usage(&command);
            Ok(())
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
            log_file,
        } => {
            use_config_dir(config_dir)?;
            // Keep the guard alive until the daemon returns so the file is flushed
            let _log_guard = match log_file {
                Some(path) => Some(Log::start_file_logging(path)?),
                None => None,
            };
            Nightfall::new(debug_enabled).run()
        }
        CliAction::StatusCommand {
            config_dir,
            json,
            at,
        } => {
            use_config_dir(config_dir)?;
            commands::status::handle_status_command(json, at.as_deref())
        }
        CliAction::ReloadCommand {
            debug_enabled,
            config_dir,
        } => {
            use_config_dir(config_dir)?;
            commands::reload::handle_reload_command(debug_enabled)
        }
        CliAction::StopCommand {
            debug_enabled,
            config_dir,
        } => {
            use_config_dir(config_dir)?;
            commands::stop::handle_stop_command(debug_enabled)
        }
        CliAction::GetCommand {
            config_dir,
            fields,
            json,
        } => {
            use_config_dir(config_dir)?;
            commands::get::handle_get_command(&fields, json)
        }
        CliAction::SetCommand {
            debug_enabled,
            config_dir,
            fields,
        } => {
            use_config_dir(config_dir)?;
            commands::set::handle_set_command(&fields, debug_enabled)
        }
    }
}

/// Pin a custom config directory. Left unset otherwise, so commands can
/// follow the directory of the running instance.
fn use_config_dir(config_dir: Option<String>) -> Result<()> {
    if config_dir.is_some() {
        config::set_config_dir(config_dir)?;
    }
    Ok(())
}
