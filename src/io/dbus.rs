//! D-Bus integration.
//!
//! - System bus: logind `PrepareForSleep`, so themes are re-evaluated right
//!   after resume instead of at the next period
//! - timerfd: wall-clock jumps (manual changes, NTP steps)
//! - Session bus: GNOME Shell readiness and the User Themes extension lookup
//!
//! Monitors run on their own threads and only talk to the main loop through
//! [`SignalMessage`]s.

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::time::TimeSpec;
use nix::sys::timerfd::{ClockId, Expiration, TimerFd, TimerFlags, TimerSetTimeFlags};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};
use zbus::blocking::Connection;
use zbus::blocking::fdo::DBusProxy;
use zbus::names::BusName;
use zbus::zvariant::OwnedValue;

use crate::common::constants::{USER_THEMES_SCHEMA, USER_THEMES_UUID};
use crate::io::signals::SignalMessage;
use crate::reactors::{CompanionLocator, Readiness};
use crate::settings::{GSettingsStore, SettingsHub, SettingsSource, SettingsStore};

const SHELL_BUS_NAME: &str = "org.gnome.Shell";
/// Time changes reported this soon after resume belong to the resume.
const RESUME_GRACE_SECS: i64 = 5;

#[zbus::proxy(
    interface = "org.freedesktop.login1.Manager",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1"
)]
trait LogindManager {
    /// `start` is true before suspending and false after resuming.
    #[zbus(signal)]
    fn prepare_for_sleep(&self, start: bool) -> zbus::Result<()>;
}

#[zbus::proxy(
    interface = "org.gnome.Shell.Extensions",
    default_service = "org.gnome.Shell",
    default_path = "/org/gnome/Shell"
)]
trait ShellExtensions {
    /// Empty for unknown extensions.
    fn get_extension_info(&self, uuid: &str) -> zbus::Result<HashMap<String, OwnedValue>>;
}

/// Shared between the sleep and time change monitors.
#[derive(Clone, Default)]
struct SleepTracker {
    is_sleeping: Arc<AtomicBool>,
    /// Unix seconds of the last resume, 0 if none
    resume_time: Arc<AtomicI64>,
}

impl SleepTracker {
    fn current_timestamp() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }

    fn ignores_time_changes(&self) -> bool {
        if self.is_sleeping.load(Ordering::SeqCst) {
            return true;
        }
        let resume_time = self.resume_time.load(Ordering::SeqCst);
        resume_time != 0 && Self::current_timestamp() - resume_time <= RESUME_GRACE_SECS
    }
}

/// Start the sleep/resume and time change monitors.
///
/// Either monitor failing only disables that detection; the daemon keeps
/// checking the time every period.
pub fn start_system_monitors(signal_sender: Sender<SignalMessage>, debug_enabled: bool) -> Result<()> {
    let tracker = SleepTracker::default();

    let sender = signal_sender.clone();
    let sleep_tracker = tracker.clone();
    thread::Builder::new()
        .name("sleep-monitor".to_string())
        .spawn(move || {
            if let Err(e) = monitor_sleep_signals(&sender, debug_enabled, &sleep_tracker) {
                log_pipe!();
                log_warning!("Sleep monitor stopped: {e:#}");
                log_indented!("Themes will be corrected at the next time check after resume");
            }
        })
        .context("Failed to spawn sleep monitor thread")?;

    thread::Builder::new()
        .name("time-monitor".to_string())
        .spawn(move || {
            if let Err(e) = monitor_time_changes(&signal_sender, debug_enabled, &tracker) {
                log_pipe!();
                log_warning!("Time change monitor stopped: {e:#}");
            }
        })
        .context("Failed to spawn time change monitor thread")?;

    Ok(())
}

fn monitor_sleep_signals(
    sender: &Sender<SignalMessage>,
    debug_enabled: bool,
    tracker: &SleepTracker,
) -> Result<()> {
    let connection = Connection::system().context("Failed to connect to system D-Bus")?;
    let logind = LogindManagerProxyBlocking::new(&connection).context("Failed to create logind proxy")?;
    let signals = logind
        .receive_prepare_for_sleep()
        .context("Failed to subscribe to PrepareForSleep")?;

    if debug_enabled {
        log_debug!("Listening for logind sleep signals");
    }

    for signal in signals {
        let args = match signal.args() {
            Ok(args) => args,
            Err(e) => {
                log_warning!("Malformed PrepareForSleep signal: {e}");
                continue;
            }
        };

        if args.start {
            tracker.is_sleeping.store(true, Ordering::SeqCst);
            if debug_enabled {
                log_pipe!();
                log_debug!("System entering sleep");
            }
            let _ = sender.send(SignalMessage::Sleep { resuming: false });
            continue;
        }

        tracker
            .resume_time
            .store(SleepTracker::current_timestamp(), Ordering::SeqCst);
        tracker.is_sleeping.store(false, Ordering::SeqCst);

        log_pipe!();
        log_info!("System resumed from sleep");
        if sender.send(SignalMessage::Sleep { resuming: true }).is_err() {
            return Ok(());
        }
    }

    anyhow::bail!("PrepareForSleep signal stream ended")
}

/// Detects wall-clock jumps with a far-future CLOCK_REALTIME timer armed
/// with `TFD_TIMER_CANCEL_ON_SET`.
struct TimeChangeDetector {
    timer: TimerFd,
}

impl TimeChangeDetector {
    fn new() -> nix::Result<Self> {
        let timer = TimerFd::new(ClockId::CLOCK_REALTIME, TimerFlags::empty())?;
        let detector = Self { timer };
        detector.arm()?;
        Ok(detector)
    }

    fn arm(&self) -> nix::Result<()> {
        let flags = TimerSetTimeFlags::TFD_TIMER_ABSTIME | TimerSetTimeFlags::TFD_TIMER_CANCEL_ON_SET;
        let far_future = TimeSpec::new(i64::MAX / 1000, 0);
        self.timer.set(Expiration::OneShot(far_future), flags)
    }

    /// Block until the clock is set.
    fn wait(&self) -> Result<()> {
        match self.timer.wait() {
            Ok(()) | Err(Errno::ECANCELED) => {
                self.arm().context("Failed to re-arm time change timer")?;
                Ok(())
            }
            Err(e) => Err(e).context("Time change timer failed"),
        }
    }
}

fn monitor_time_changes(
    sender: &Sender<SignalMessage>,
    debug_enabled: bool,
    tracker: &SleepTracker,
) -> Result<()> {
    let detector = TimeChangeDetector::new().context("Failed to create time change detector")?;

    loop {
        detector.wait()?;
        if tracker.ignores_time_changes() {
            continue;
        }

        log_pipe!();
        log_info!("System time changed");
        if sender.send(SignalMessage::TimeChange).is_err() {
            if debug_enabled {
                log_indented!("Main loop gone, stopping time change monitor");
            }
            return Ok(());
        }
    }
}

/// Waits for `org.gnome.Shell` to appear on the session bus.
pub struct ShellReadiness {
    sender: Sender<SignalMessage>,
    waiting: Arc<AtomicBool>,
    debug_enabled: bool,
}

impl ShellReadiness {
    pub fn new(sender: Sender<SignalMessage>, debug_enabled: bool) -> Self {
        Self {
            sender,
            waiting: Arc::new(AtomicBool::new(false)),
            debug_enabled,
        }
    }
}

impl Readiness for ShellReadiness {
    fn request(&self) {
        // One waiter at a time; it answers every request made meanwhile
        if self.waiting.swap(true, Ordering::SeqCst) {
            return;
        }

        let sender = self.sender.clone();
        let waiting = self.waiting.clone();
        let debug_enabled = self.debug_enabled;
        let spawned = thread::Builder::new()
            .name("shell-readiness".to_string())
            .spawn(move || {
                match wait_for_shell(debug_enabled) {
                    Ok(()) => {
                        let _ = sender.send(SignalMessage::CompanionReady);
                    }
                    Err(e) => log_warning!("Cannot tell when GNOME Shell is ready: {e:#}"),
                }
                waiting.store(false, Ordering::SeqCst);
            });

        if let Err(e) = spawned {
            log_warning!("Failed to spawn shell readiness thread: {e}");
            self.waiting.store(false, Ordering::SeqCst);
        }
    }
}

fn wait_for_shell(debug_enabled: bool) -> Result<()> {
    let connection = Connection::session().context("Failed to connect to session D-Bus")?;
    let bus = DBusProxy::new(&connection).context("Failed to create D-Bus proxy")?;
    let shell = BusName::try_from(SHELL_BUS_NAME)?;

    // Subscribe first so an owner appearing in between is not missed
    let changes = bus.receive_name_owner_changed()?;
    if bus.name_has_owner(shell.clone())? {
        return Ok(());
    }

    if debug_enabled {
        log_debug!("Waiting for {SHELL_BUS_NAME} on the session bus");
    }
    for change in changes {
        let args = change.args()?;
        if args.name == shell && args.new_owner.is_some() {
            return Ok(());
        }
    }
    anyhow::bail!("NameOwnerChanged stream ended")
}

/// Finds the User Themes extension through GNOME Shell and exposes its
/// settings.
pub struct ExtensionLocator {
    hub: SettingsHub,
    connection: Mutex<Option<Connection>>,
}

impl ExtensionLocator {
    pub fn new(hub: SettingsHub) -> Self {
        Self {
            hub,
            connection: Mutex::new(None),
        }
    }

    fn extension_path(&self) -> Result<Option<String>> {
        let mut connection = self.connection.lock().unwrap_or_else(PoisonError::into_inner);
        if connection.is_none() {
            *connection = Some(Connection::session().context("Failed to connect to session D-Bus")?);
        }
        let Some(conn) = connection.as_ref() else {
            return Ok(None);
        };

        let reply = ShellExtensionsProxyBlocking::new(conn)
            .and_then(|extensions| extensions.get_extension_info(USER_THEMES_UUID));
        let info = match reply {
            Ok(info) => info,
            Err(e) => {
                // Reconnect on the next lookup
                *connection = None;
                return Err(e).context("GetExtensionInfo failed");
            }
        };

        Ok(info
            .get("path")
            .and_then(|value| <&str>::try_from(&**value).ok())
            .map(str::to_string))
    }
}

impl CompanionLocator for ExtensionLocator {
    fn locate(&self) -> Option<Arc<dyn SettingsStore>> {
        let path = match self.extension_path() {
            Ok(Some(path)) => path,
            Ok(None) => return None,
            Err(e) => {
                log_warning!("User Themes lookup failed: {e:#}");
                return None;
            }
        };

        let mut store = GSettingsStore::new(SettingsSource::UserThemes, USER_THEMES_SCHEMA, self.hub.clone());
        let schema_dir = Path::new(&path).join("schemas");
        if schema_dir.is_dir() {
            store = store.with_schema_dir(&schema_dir);
        }

        if !store.is_available() {
            log_warning!("User Themes is installed but its settings schema is missing");
            return None;
        }
        Some(Arc::new(store))
    }
}
