//! # nightfall Library
//!
//! Internal library for the nightfall binary: switches the GTK theme, the
//! GNOME Shell theme and user commands between a day and a night variant.
//!
//! This library exists to enable testing of the internals and provide clean
//! separation between CLI dispatch (main.rs) and application logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Nightfall` acquires resources and builds the assembly
//! - **Core Logic**: `core` holds the day/night state machine, the time check
//!   and the main loop
//! - **Nighttime**: `nighttime` providers of the nighttime window (manual
//!   minutes or the GNOME Night Light schedule)
//! - **Reactors**: `reactors` apply a state (GTK theme, shell theme, commands)
//! - **Settings**: `settings` stores with change subscriptions (TOML file,
//!   gsettings, in-memory)
//! - **Configuration**: `config` for TOML-based settings with hot-reload
//! - **Commands**: `commands` module for CLI subcommands
//! - **Infrastructure**: Signal handling, D-Bus monitoring, processes, logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod common;

// Public API modules
pub mod args;
pub mod commands;
pub mod config;
pub mod core;
pub mod io;
pub mod nighttime;
pub mod reactors;
pub mod settings;
pub mod time_source;

mod nightfall;

// Re-export for binary
pub use nightfall::Nightfall;
