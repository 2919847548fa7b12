//! Terminal-backed sinks used by the CLI.

use std::io::Write;
use std::sync::OnceLock;

use super::{Chime, NotificationPermission, Permission, Presenter, SystemNotifier, ToastKind};
use crate::error::NotifyError;

/// Prints toasts as tagged lines on stdout.
#[derive(Debug, Default)]
pub struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn show_transient(&self, kind: ToastKind, message: &str, description: Option<&str>) {
        let tag = match kind {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
        };
        match description {
            Some(desc) => println!("[{tag}] {message}: {desc}"),
            None => println!("[{tag}] {message}"),
        }
    }
}

/// Highlighted banner on stderr, standing in for an OS notification.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl SystemNotifier for ConsoleNotifier {
    fn dispatch(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let mut err = std::io::stderr().lock();
        writeln!(err, "\x1b[1;33m*** {title} ***\x1b[0m\n    {body}")
            .map_err(|e| NotifyError::DispatchFailed(e.to_string()))
    }
}

/// Permission driven by the `alarms.system_notifications` setting.
///
/// Opted-in users start `Undetermined` and are granted on the first
/// `request()`; opted-out users are always denied.
#[derive(Debug)]
pub struct ConfigPermission {
    opted_in: bool,
    answer: OnceLock<Permission>,
}

impl ConfigPermission {
    pub fn new(opted_in: bool) -> Self {
        Self {
            opted_in,
            answer: OnceLock::new(),
        }
    }
}

impl NotificationPermission for ConfigPermission {
    fn query(&self) -> Permission {
        if !self.opted_in {
            return Permission::Denied;
        }
        self.answer.get().copied().unwrap_or(Permission::Undetermined)
    }

    fn request(&self) -> Permission {
        let opted_in = self.opted_in;
        *self.answer.get_or_init(|| {
            if opted_in {
                Permission::Granted
            } else {
                Permission::Denied
            }
        })
    }
}

/// Rings the terminal bell.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl Chime for TerminalBell {
    fn play(&self) -> Result<(), NotifyError> {
        let mut out = std::io::stdout().lock();
        out.write_all(b"\x07")
            .and_then(|_| out.flush())
            .map_err(|e| NotifyError::AudioUnavailable(e.to_string()))
    }
}

/// Chime used when sound is turned off.
#[derive(Debug, Default)]
pub struct SilentChime;

impl Chime for SilentChime {
    fn play(&self) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opted_in_permission_resolves_once() {
        let p = ConfigPermission::new(true);
        assert_eq!(p.query(), Permission::Undetermined);
        assert_eq!(p.request(), Permission::Granted);
        assert_eq!(p.query(), Permission::Granted);
        assert_eq!(p.request(), Permission::Granted);
    }

    #[test]
    fn opted_out_permission_is_denied() {
        let p = ConfigPermission::new(false);
        assert_eq!(p.query(), Permission::Denied);
        assert_eq!(p.request(), Permission::Denied);
    }
}
