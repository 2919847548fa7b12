use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, TimerSession, TimerState};

/// Every timer state change produces an Event.
/// The host polls or subscribes for them; persistence reacts to completions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// `skip_break()` was called. `from_phase` records whether a break was
    /// actually running; skipping from focus restarts the focus countdown.
    BreakSkipped {
        from_phase: Phase,
        at: DateTime<Utc>,
    },
    DurationsChanged {
        work_minutes: u32,
        break_minutes: u32,
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
    /// A focus phase ran to zero. Triggers the persistence upsert.
    SessionComplete {
        sessions_completed: u32,
        work_minutes: u32,
        break_minutes: u32,
        at: DateTime<Utc>,
    },
    /// A break ran to zero and the timer is back in Focus-Idle.
    BreakOver {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        session: TimerSession,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// True for the two phase-completion events.
    pub fn is_completion(&self) -> bool {
        matches!(self, Event::SessionComplete { .. } | Event::BreakOver { .. })
    }

    /// In-app message shown when a phase completes.
    pub fn completion_message(&self) -> Option<&'static str> {
        match self {
            Event::SessionComplete { .. } => Some("Great job! Take a break!"),
            Event::BreakOver { .. } => Some("Break over! Time to focus!"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let ev = Event::BreakOver { at: Utc::now() };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "BreakOver");
    }

    #[test]
    fn only_completions_carry_messages() {
        let done = Event::SessionComplete {
            sessions_completed: 1,
            work_minutes: 25,
            break_minutes: 5,
            at: Utc::now(),
        };
        assert!(done.is_completion());
        assert_eq!(done.completion_message(), Some("Great job! Take a break!"));

        let reset = Event::TimerReset { at: Utc::now() };
        assert!(!reset.is_completion());
        assert!(reset.completion_message().is_none());
    }
}
