//! Day/night state shared by reactors and the time check.

use std::fmt;

/// The state a reactor was last brought into.
///
/// `Unknown` is the only state of a disabled reactor and never triggers a
/// callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Unknown,
    Day,
    Night,
}

impl State {
    /// The state matching a nighttime check.
    pub fn from_nighttime(is_night: bool) -> Self {
        if is_night { State::Night } else { State::Day }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Unknown => "unknown",
            State::Day => "day",
            State::Night => "night",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
