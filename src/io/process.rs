//! Background command execution.

use std::process::{Command, Stdio};
use std::thread;

use crate::reactors::CommandRunner;

/// Runs commands with `/bin/sh -c`, detached from nightfall's stdio.
///
/// Children are reaped on a short-lived thread so they never linger as
/// zombies.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn spawn(&self, command: &str) -> bool {
        let child = Command::new("/bin/sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match child {
            Ok(mut child) => {
                let reaper = thread::Builder::new()
                    .name("command-reaper".to_string())
                    .spawn(move || {
                        let _ = child.wait();
                    });
                if let Err(e) = reaper {
                    log_warning!("Failed to spawn reaper thread: {e}");
                }
                true
            }
            Err(e) => {
                log_warning!("Failed to run /bin/sh: {e}");
                false
            }
        }
    }
}
