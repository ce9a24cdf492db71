//! Box-drawn terminal output for the daemon and its commands.
//!
//! Every line goes through [`emit`], which renders one [`Line`] variant with
//! an optional `[HH:MM:SS]` prefix and routes the result either to stdout or,
//! once `--log` installed a file sink, to a writer thread that appends it to
//! the log file without color codes.
//!
//! Layout of a typical run:
//!
//! ```text
//! ┏ nightfall v0.1.0 ━━╸
//! ┃
//! ┣ Loaded configuration
//! ┃   Nighttime: 20:00 to 06:00
//! ┣[WARNING] Shell theme companion not found
//! ╹
//! ```
//!
//! `log_block_start!` opens a block with an empty `┃` above it,
//! `log_decorated!` continues it and `log_indented!` nests details under it.
//! `log_pipe!` only goes before a level message that opens a block of its
//! own, never at the end of one.

use std::fmt;
use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};
use std::thread::JoinHandle;

static ENABLED: AtomicBool = AtomicBool::new(true);
static TIMESTAMPS: AtomicBool = AtomicBool::new(false);
static FILE_SINK: OnceLock<Sender<Record>> = OnceLock::new();

enum Record {
    Text(String),
    Close,
}

/// Shape of a logged line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Header,
    Pipe,
    BlockStart,
    Decorated,
    Indented,
    End,
    Info,
    Debug,
    Warning,
    Error,
    /// Error that ends the flow, closed with `┗`.
    Fatal,
    /// Warning printed outside of a block, without the pipe.
    LooseWarning,
}

impl Line {
    fn level(self) -> Option<(&'static str, &'static str)> {
        match self {
            Line::Info => Some(("INFO", "32")),
            Line::Debug => Some(("DEBUG", "32")),
            Line::Warning | Line::LooseWarning => Some(("WARNING", "33")),
            Line::Error | Line::Fatal => Some(("ERROR", "31")),
            _ => None,
        }
    }

    fn render(self, stamp: &str, message: fmt::Arguments<'_>) -> String {
        if let Some((label, color)) = self.level() {
            let lead = match self {
                Line::Fatal => format!("{stamp}┃\n{stamp}┗"),
                Line::LooseWarning => stamp.to_string(),
                _ => format!("{stamp}┣"),
            };
            return format!("{lead}[\x1b[{color}m{label}\x1b[0m] {message}\n");
        }

        match self {
            Line::Header => format!("{stamp}┏ {message} ━━╸\n"),
            Line::Pipe => format!("{stamp}┃\n"),
            Line::BlockStart => format!("{stamp}┃\n{stamp}┣ {message}\n"),
            Line::Decorated => format!("{stamp}┣ {message}\n"),
            Line::Indented => format!("{stamp}┃   {message}\n"),
            _ => format!("{stamp}╹\n"),
        }
    }
}

/// Global switches of the logger.
pub struct Log;

impl Log {
    /// Silence all output (tests, `--json` callers).
    pub fn set_enabled(enabled: bool) {
        ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        ENABLED.load(Ordering::SeqCst)
    }

    pub fn set_timestamps(enabled: bool) {
        TIMESTAMPS.store(enabled, Ordering::SeqCst);
    }

    /// Append all further output to `path`.
    ///
    /// Turns timestamps on. The returned guard flushes and closes the file
    /// when dropped; output after that is discarded, since the sink can only
    /// be installed once per process.
    pub fn start_file_logging(path: String) -> anyhow::Result<LoggerGuard> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| anyhow::anyhow!("Cannot open log file {path}: {e}"))?;

        let (tx, rx) = channel::<Record>();
        FILE_SINK
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("File logging is already active"))?;

        let writer = std::thread::Builder::new()
            .name("log-writer".into())
            .spawn(move || -> std::io::Result<()> {
                while let Ok(Record::Text(text)) = rx.recv() {
                    file.write_all(text.as_bytes())?;
                }
                file.flush()
            })?;

        Self::set_timestamps(true);
        Ok(LoggerGuard {
            tx,
            writer: Some(writer),
        })
    }
}

/// Keeps the log file writer alive.
pub struct LoggerGuard {
    tx: Sender<Record>,
    writer: Option<JoinHandle<std::io::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(Record::Close);
        if let Some(writer) = self.writer.take() {
            let _ = writer.join();
        }
    }
}

fn timestamp() -> String {
    if TIMESTAMPS.load(Ordering::SeqCst) {
        format!("[{}] ", chrono::Local::now().format("%H:%M:%S"))
    } else {
        String::new()
    }
}

/// Render and write one line. Used by the `log_*!` macros.
pub fn emit(line: Line, message: fmt::Arguments<'_>) {
    if !Log::is_enabled() {
        return;
    }

    let text = line.render(&timestamp(), message);
    match FILE_SINK.get() {
        Some(tx) => {
            let _ = tx.send(Record::Text(strip_ansi_codes(&text)));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            let _ = stdout.write_all(text.as_bytes());
            let _ = stdout.flush();
        }
    }
}

/// Drop `ESC [ ... m` color sequences.
fn strip_ansi_codes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("\x1b[") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        match tail.find('m') {
            Some(end) => rest = &tail[end + 1..],
            None => {
                rest = tail;
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

#[macro_export]
macro_rules! log_version {
    () => {
        $crate::common::logger::emit(
            $crate::common::logger::Line::Header,
            format_args!("nightfall v{}", env!("CARGO_PKG_VERSION")),
        )
    };
}

#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::common::logger::emit($crate::common::logger::Line::Pipe, format_args!(""))
    };
}

#[macro_export]
macro_rules! log_end {
    () => {
        $crate::common::logger::emit($crate::common::logger::Line::End, format_args!(""))
    };
}

#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)*) => {
        $crate::common::logger::emit($crate::common::logger::Line::BlockStart, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)*) => {
        $crate::common::logger::emit($crate::common::logger::Line::Decorated, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)*) => {
        $crate::common::logger::emit($crate::common::logger::Line::Indented, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::common::logger::emit($crate::common::logger::Line::Info, format_args!($($arg)*))
    };
}

/// Operational detail, printed when the caller runs with `--debug`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::common::logger::emit($crate::common::logger::Line::Debug, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::common::logger::emit($crate::common::logger::Line::Warning, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warning_standalone {
    ($($arg:tt)*) => {
        $crate::common::logger::emit($crate::common::logger::Line::LooseWarning, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::common::logger::emit($crate::common::logger::Line::Error, format_args!($($arg)*))
    };
}

/// Error closing the output with `┗`. Does not exit; callers do.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)*) => {
        $crate::common::logger::emit($crate::common::logger::Line::Fatal, format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(line: Line, message: &str) -> String {
        line.render("", format_args!("{message}"))
    }

    #[test]
    fn test_render_structure_lines() {
        assert_eq!(render(Line::BlockStart, "Loaded"), "┃\n┣ Loaded\n");
        assert_eq!(render(Line::Decorated, "x"), "┣ x\n");
        assert_eq!(render(Line::Indented, "x"), "┃   x\n");
        assert_eq!(render(Line::Header, "nightfall v1"), "┏ nightfall v1 ━━╸\n");
        assert_eq!(render(Line::End, ""), "╹\n");
    }

    #[test]
    fn test_render_levels() {
        assert_eq!(
            strip_ansi_codes(&render(Line::Warning, "careful")),
            "┣[WARNING] careful\n"
        );
        assert_eq!(
            strip_ansi_codes(&render(Line::Fatal, "boom")),
            "┃\n┗[ERROR] boom\n"
        );
        assert_eq!(
            strip_ansi_codes(&render(Line::LooseWarning, "alone")),
            "[WARNING] alone\n"
        );
    }

    #[test]
    fn test_timestamp_prefix_on_every_row() {
        let text = Line::BlockStart.render("[12:00:00] ", format_args!("tick"));
        assert_eq!(text, "[12:00:00] ┃\n[12:00:00] ┣ tick\n");
    }

    #[test]
    fn test_strip_ansi_codes() {
        assert_eq!(
            strip_ansi_codes("┣[\x1b[33mWARNING\x1b[0m] careful\n"),
            "┣[WARNING] careful\n"
        );
        assert_eq!(strip_ansi_codes("┃   plain"), "┃   plain");
        assert_eq!(strip_ansi_codes("cut \x1b[3"), "cut 3");
    }
}
