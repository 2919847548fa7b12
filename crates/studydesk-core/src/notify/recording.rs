//! In-memory sinks that record what they were asked to show.
//! Used by tests and by hosts that render notifications themselves.

use std::sync::Mutex;

use super::{Chime, NotificationPermission, Permission, Presenter, SystemNotifier, ToastKind};
use crate::error::NotifyError;

/// Permission that never changes.
#[derive(Debug)]
pub struct FixedPermission(Permission);

impl FixedPermission {
    pub fn new(permission: Permission) -> Self {
        Self(permission)
    }
}

impl NotificationPermission for FixedPermission {
    fn query(&self) -> Permission {
        self.0
    }

    fn request(&self) -> Permission {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    /// Records the attempt, then reports failure.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl SystemNotifier for RecordingNotifier {
    fn dispatch(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((title.to_string(), body.to_string()));
        }
        if self.fail {
            return Err(NotifyError::DispatchFailed("recording notifier set to fail".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingPresenter {
    shown: Mutex<Vec<(ToastKind, String, Option<String>)>>,
}

impl RecordingPresenter {
    pub fn shown(&self) -> Vec<(ToastKind, String, Option<String>)> {
        self.shown.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Presenter for RecordingPresenter {
    fn show_transient(&self, kind: ToastKind, message: &str, description: Option<&str>) {
        if let Ok(mut shown) = self.shown.lock() {
            shown.push((kind, message.to_string(), description.map(str::to_string)));
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingChime {
    plays: Mutex<usize>,
    fail: bool,
}

impl RecordingChime {
    pub fn failing() -> Self {
        Self {
            plays: Mutex::new(0),
            fail: true,
        }
    }

    pub fn plays(&self) -> usize {
        self.plays.lock().map(|n| *n).unwrap_or(0)
    }
}

impl Chime for RecordingChime {
    fn play(&self) -> Result<(), NotifyError> {
        if let Ok(mut n) = self.plays.lock() {
            *n += 1;
        }
        if self.fail {
            return Err(NotifyError::AudioUnavailable("no output device".into()));
        }
        Ok(())
    }
}
