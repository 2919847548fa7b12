//! Notification seams: OS-level notifications behind a permission gate,
//! in-app transient messages, and the completion chime.
//!
//! Every sink here is best-effort. Failures are logged and dropped; none of
//! them can stop the timer or the alarm loop.

mod console;
mod recording;

pub use console::{ConfigPermission, ConsoleNotifier, ConsolePresenter, SilentChime, TerminalBell};
pub use recording::{FixedPermission, RecordingChime, RecordingNotifier, RecordingPresenter};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::alarm::AlarmEvent;
use crate::error::NotifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    Undetermined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// Permission gate for system notifications.
pub trait NotificationPermission: Send + Sync {
    fn query(&self) -> Permission;

    /// Ask the user. Resolves once; later calls return the same answer.
    fn request(&self) -> Permission;
}

/// OS-level notification sink. Only called when permission is granted.
pub trait SystemNotifier: Send + Sync {
    fn dispatch(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// In-app transient message ("toast"). Fire-and-forget.
pub trait Presenter: Send + Sync {
    fn show_transient(&self, kind: ToastKind, message: &str, description: Option<&str>);
}

/// Audible alert on phase completion.
pub trait Chime: Send + Sync {
    fn play(&self) -> Result<(), NotifyError>;
}

/// Play the chime, swallowing any failure.
pub fn play_best_effort(chime: &dyn Chime) {
    if let Err(e) = chime.play() {
        debug!("chime unavailable: {e}");
    }
}

/// Fans one alarm out to the system notifier (when permitted) and the
/// in-app presenter (always).
pub struct AlarmDispatcher<'a> {
    permission: &'a dyn NotificationPermission,
    notifier: &'a dyn SystemNotifier,
    presenter: &'a dyn Presenter,
}

impl<'a> AlarmDispatcher<'a> {
    pub fn new(
        permission: &'a dyn NotificationPermission,
        notifier: &'a dyn SystemNotifier,
        presenter: &'a dyn Presenter,
    ) -> Self {
        Self {
            permission,
            notifier,
            presenter,
        }
    }

    pub fn dispatch(&self, alarm: &AlarmEvent) {
        let title = alarm.title();
        let body = alarm.body();

        if self.permission.query() == Permission::Granted {
            if let Err(e) = self.notifier.dispatch(&title, &body) {
                warn!(task_id = %alarm.task_id, "system notification failed: {e}");
            }
        }

        self.presenter
            .show_transient(ToastKind::Info, &title, Some(&body));
    }
}
