// Shared by every other module; the logger macros are declared first so
// the sibling modules below can use them.
#[macro_use]
pub mod logger;

pub mod constants;
pub mod utils;
