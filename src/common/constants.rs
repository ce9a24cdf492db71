//! Application-wide constants and default values.
//!
//! Defaults mirror the values written into a freshly generated `nightfall.toml`,
//! limits are enforced by `config::validation`.

// # Application Metadata
pub const APP_NAME: &str = "nightfall";
pub const CONFIG_FILE_NAME: &str = "nightfall.toml";
pub const LOCK_FILE_NAME: &str = "nightfall.lock";

// # Settings Keys
// Keys of the extension settings, identical to the field names in nightfall.toml
pub const KEY_DAY_THEME: &str = "day-theme";
pub const KEY_NIGHT_THEME: &str = "night-theme";
pub const KEY_DAY_SHELL: &str = "day-shell";
pub const KEY_NIGHT_SHELL: &str = "night-shell";
pub const KEY_DAY_COMMAND: &str = "day-command";
pub const KEY_NIGHT_COMMAND: &str = "night-command";
pub const KEY_NIGHTTIME_BEGIN: &str = "nighttime-begin";
pub const KEY_NIGHTTIME_END: &str = "nighttime-end";
pub const KEY_TIME_CHECK_PERIOD: &str = "time-check-period";
pub const KEY_SHELL_ENABLED: &str = "shell-enabled";
pub const KEY_COMMANDS_ENABLED: &str = "commands-enabled";
pub const KEY_NIGHTTIME_FROM_NIGHT_LIGHT: &str = "nighttime-from-night-light";
pub const KEY_FIRST_TIME_USER: &str = "first-time-user";

// # GNOME Schemas
pub const INTERFACE_SCHEMA: &str = "org.gnome.desktop.interface";
pub const INTERFACE_GTK_THEME_KEY: &str = "gtk-theme";
pub const COLOR_SCHEMA: &str = "org.gnome.settings-daemon.plugins.color";
pub const NIGHT_LIGHT_FROM_KEY: &str = "night-light-schedule-from";
pub const NIGHT_LIGHT_TO_KEY: &str = "night-light-schedule-to";
pub const USER_THEMES_SCHEMA: &str = "org.gnome.shell.extensions.user-theme";
pub const USER_THEMES_NAME_KEY: &str = "name";
pub const USER_THEMES_UUID: &str = "user-theme@gnome-shell-extensions.gcampax.github.com";

// # Default Values
pub const DEFAULT_DAY_THEME: &str = "Adwaita";
pub const DEFAULT_NIGHT_THEME: &str = "Adwaita-dark";
pub const DEFAULT_DAY_SHELL: &str = "";
pub const DEFAULT_NIGHT_SHELL: &str = "";
pub const DEFAULT_DAY_COMMAND: &str = "";
pub const DEFAULT_NIGHT_COMMAND: &str = "";
pub const DEFAULT_NIGHTTIME_BEGIN: u32 = 1200; // 20:00
pub const DEFAULT_NIGHTTIME_END: u32 = 420; // 07:00
pub const DEFAULT_TIME_CHECK_PERIOD: u32 = 1000; // milliseconds
pub const DEFAULT_SHELL_ENABLED: bool = false;
pub const DEFAULT_COMMANDS_ENABLED: bool = false;
pub const DEFAULT_NIGHTTIME_FROM_NIGHT_LIGHT: bool = false;
pub const DEFAULT_FIRST_TIME_USER: bool = true;

// # Validation Limits
pub const MINUTES_PER_DAY: u32 = 24 * 60;
pub const MAXIMUM_MINUTE_OF_DAY: u32 = MINUTES_PER_DAY - 1; // 23:59
pub const MINIMUM_TIME_CHECK_PERIOD: u32 = 10; // milliseconds
pub const MAXIMUM_TIME_CHECK_PERIOD: u32 = 1_800_000; // 30 minutes

// # Timing
/// Debounce duration for config file change events (milliseconds).
pub const CONFIG_WATCH_DEBOUNCE_MS: u64 = 500;
/// How long `nightfall stop` waits for the running instance to exit (milliseconds).
pub const STOP_TIMEOUT_MS: u64 = 3000;

// # Exit Codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
