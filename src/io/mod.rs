//! Everything that talks to the outside world: the session and system bus,
//! the instance lock, child processes and Unix signals.

pub mod dbus;
pub mod instance;
pub mod lock;
pub mod process;
pub mod signals;
