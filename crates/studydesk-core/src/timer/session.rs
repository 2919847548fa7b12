use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Focus,
    Break,
}

/// The four states of the focus/break machine, derived from
/// `is_active × is_break`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    FocusIdle,
    FocusRunning,
    BreakIdle,
    BreakRunning,
}

/// Configured phase lengths in minutes. Both are always greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    work_minutes: u32,
    break_minutes: u32,
}

impl Durations {
    pub fn new(work_minutes: u32, break_minutes: u32) -> Result<Self, ValidationError> {
        if work_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "work_minutes".into(),
                message: "must be greater than zero".into(),
            });
        }
        if break_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "break_minutes".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(Self {
            work_minutes,
            break_minutes,
        })
    }

    pub fn work_minutes(&self) -> u32 {
        self.work_minutes
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    pub fn work_secs(&self) -> u64 {
        u64::from(self.work_minutes) * 60
    }

    pub fn break_secs(&self) -> u64 {
        u64::from(self.break_minutes) * 60
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            work_minutes: DEFAULT_WORK_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
        }
    }
}

/// Snapshot of the timer as seen by the host UI.
///
/// `time_left_secs` is always within `0..=phase_duration_secs()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSession {
    pub is_active: bool,
    pub is_break: bool,
    pub time_left_secs: u64,
    pub sessions_completed: u32,
    pub work_minutes: u32,
    pub break_minutes: u32,
}

impl TimerSession {
    /// Focus-Idle with a full focus countdown.
    pub fn fresh(durations: Durations) -> Self {
        Self {
            is_active: false,
            is_break: false,
            time_left_secs: durations.work_secs(),
            sessions_completed: 0,
            work_minutes: durations.work_minutes(),
            break_minutes: durations.break_minutes(),
        }
    }

    pub fn phase(&self) -> Phase {
        if self.is_break {
            Phase::Break
        } else {
            Phase::Focus
        }
    }

    pub fn state(&self) -> TimerState {
        match (self.is_break, self.is_active) {
            (false, false) => TimerState::FocusIdle,
            (false, true) => TimerState::FocusRunning,
            (true, false) => TimerState::BreakIdle,
            (true, true) => TimerState::BreakRunning,
        }
    }

    pub fn phase_duration_secs(&self) -> u64 {
        let minutes = if self.is_break {
            self.break_minutes
        } else {
            self.work_minutes
        };
        u64::from(minutes) * 60
    }

    /// 0.0 .. 1.0 elapsed fraction of the current phase.
    pub fn progress(&self) -> f64 {
        let total = self.phase_duration_secs();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.time_left_secs as f64 / total as f64)
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.time_left_secs / 60,
            self.time_left_secs % 60
        )
    }
}

/// Persisted form of a user's timer, one row per user.
///
/// Only counters and durations survive a reload; the countdown itself does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub user_id: String,
    pub sessions_completed: u32,
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_reject_zero() {
        assert!(Durations::new(0, 5).is_err());
        assert!(Durations::new(25, 0).is_err());
        assert!(Durations::new(1, 1).is_ok());
    }

    #[test]
    fn fresh_session_is_focus_idle() {
        let s = TimerSession::fresh(Durations::default());
        assert_eq!(s.state(), TimerState::FocusIdle);
        assert_eq!(s.time_left_secs, 25 * 60);
        assert_eq!(s.display(), "25:00");
        assert_eq!(s.progress(), 0.0);
    }

    #[test]
    fn phase_duration_follows_break_flag() {
        let mut s = TimerSession::fresh(Durations::new(50, 10).unwrap());
        assert_eq!(s.phase_duration_secs(), 3000);
        s.is_break = true;
        assert_eq!(s.phase(), Phase::Break);
        assert_eq!(s.phase_duration_secs(), 600);
    }

    #[test]
    fn display_pads_minutes_and_seconds() {
        let mut s = TimerSession::fresh(Durations::default());
        s.time_left_secs = 65;
        assert_eq!(s.display(), "01:05");
    }
}
