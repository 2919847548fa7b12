//! Timer engine implementation.
//!
//! The engine is an event-counted state machine. It does not use internal
//! threads or read the clock for progress; the caller invokes `tick()` once
//! per trigger period (one second in production).
//!
//! ## State Transitions
//!
//! ```text
//!              start                 tick to 0
//! Focus-Idle ────────► Focus-Running ─────────► Break-Idle
//!     ▲  ▲                  │ pause                │ start
//!     │  └──────────────────┘                      ▼
//!     │         tick to 0 / skip_break       Break-Running
//!     └────────────────────────────────────────────┘
//! ```
//!
//! `reset()` and `skip_break()` return to Focus-Idle from any state.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(Durations::default());
//! engine.start();
//! // Once per second:
//! if let Some(event) = engine.tick() { /* SessionComplete or BreakOver */ }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::session::{Durations, Phase, SessionSnapshot, TimerSession, TimerState};
use crate::error::ValidationError;
use crate::events::Event;

/// Core timer engine. Sole owner of its [`TimerSession`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    session: TimerSession,
}

impl TimerEngine {
    /// Create a new engine in Focus-Idle with a full focus countdown.
    pub fn new(durations: Durations) -> Self {
        Self {
            session: TimerSession::fresh(durations),
        }
    }

    /// Seed counters and durations from a persisted snapshot.
    ///
    /// The countdown is not part of the snapshot, so the engine lands in
    /// Focus-Idle with the restored work duration. Snapshots with a zero
    /// duration fall back to the defaults for that field.
    pub fn restore(snapshot: &SessionSnapshot) -> Self {
        let defaults = Durations::default();
        let durations = Durations::new(
            nonzero_or(snapshot.work_minutes, defaults.work_minutes()),
            nonzero_or(snapshot.break_minutes, defaults.break_minutes()),
        )
        .unwrap_or(defaults);
        let mut engine = Self::new(durations);
        engine.session.sessions_completed = snapshot.sessions_completed;
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &TimerSession {
        &self.session
    }

    pub fn state(&self) -> TimerState {
        self.session.state()
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn durations(&self) -> Durations {
        Durations::new(self.session.work_minutes, self.session.break_minutes)
            .unwrap_or_default()
    }

    /// Persisted form for `user_id`.
    pub fn to_snapshot(&self, user_id: &str) -> SessionSnapshot {
        SessionSnapshot {
            user_id: user_id.to_string(),
            sessions_completed: self.session.sessions_completed,
            work_minutes: self.session.work_minutes,
            break_minutes: self.session.break_minutes,
            is_active: self.session.is_active,
            updated_at: Utc::now(),
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state(),
            session: self.session.clone(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Resume the countdown without touching `time_left_secs`.
    pub fn start(&mut self) -> Option<Event> {
        if self.session.is_active {
            return None;
        }
        self.session.is_active = true;
        Some(Event::TimerStarted {
            phase: self.phase(),
            time_left_secs: self.session.time_left_secs,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.session.is_active {
            return None;
        }
        self.session.is_active = false;
        Some(Event::TimerPaused {
            phase: self.phase(),
            time_left_secs: self.session.time_left_secs,
            at: Utc::now(),
        })
    }

    /// Back to Focus-Idle with a full focus countdown. Idempotent.
    pub fn reset(&mut self) -> Option<Event> {
        self.enter_focus_idle();
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Force Focus-Idle with a full focus countdown.
    ///
    /// Not guarded by phase: calling it during focus restarts the focus
    /// countdown as well. The event records which phase it came from.
    pub fn skip_break(&mut self) -> Option<Event> {
        let from_phase = self.phase();
        self.enter_focus_idle();
        Some(Event::BreakSkipped {
            from_phase,
            at: Utc::now(),
        })
    }

    /// Replace both durations and restart the active phase's countdown at
    /// its new full length. A partially elapsed countdown is discarded.
    pub fn set_durations(
        &mut self,
        work_minutes: u32,
        break_minutes: u32,
    ) -> Result<Option<Event>, ValidationError> {
        let durations = Durations::new(work_minutes, break_minutes)?;
        self.session.work_minutes = durations.work_minutes();
        self.session.break_minutes = durations.break_minutes();
        self.session.time_left_secs = self.session.phase_duration_secs();
        Ok(Some(Event::DurationsChanged {
            work_minutes,
            break_minutes,
            time_left_secs: self.session.time_left_secs,
            at: Utc::now(),
        }))
    }

    /// Call once per elapsed trigger period.
    ///
    /// Returns `Some(Event::SessionComplete)` or `Some(Event::BreakOver)` on
    /// the tick that finishes a phase.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.session.is_active {
            return None;
        }
        if self.session.time_left_secs > 0 {
            self.session.time_left_secs -= 1;
        }
        if self.session.time_left_secs == 0 {
            return Some(self.complete_phase());
        }
        None
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_phase(&mut self) -> Event {
        if self.session.is_break {
            self.enter_focus_idle();
            Event::BreakOver { at: Utc::now() }
        } else {
            self.session.sessions_completed = self.session.sessions_completed.saturating_add(1);
            self.session.is_active = false;
            self.session.is_break = true;
            self.session.time_left_secs = self.session.phase_duration_secs();
            Event::SessionComplete {
                sessions_completed: self.session.sessions_completed,
                work_minutes: self.session.work_minutes,
                break_minutes: self.session.break_minutes,
                at: Utc::now(),
            }
        }
    }

    fn enter_focus_idle(&mut self) {
        self.session.is_active = false;
        self.session.is_break = false;
        self.session.time_left_secs = self.session.phase_duration_secs();
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(Durations::default())
    }
}

fn nonzero_or(value: u32, fallback: u32) -> u32 {
    if value == 0 {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_ticks(engine: &mut TimerEngine, n: u64) -> Vec<Event> {
        (0..n).filter_map(|_| engine.tick()).collect()
    }

    #[test]
    fn start_pause_start() {
        let mut engine = TimerEngine::default();
        assert_eq!(engine.state(), TimerState::FocusIdle);

        assert!(engine.start().is_some());
        assert_eq!(engine.state(), TimerState::FocusRunning);
        assert!(engine.start().is_none());

        engine.tick();
        assert!(engine.pause().is_some());
        assert_eq!(engine.state(), TimerState::FocusIdle);
        assert_eq!(engine.session().time_left_secs, 25 * 60 - 1);
        assert!(engine.pause().is_none());

        engine.start();
        assert_eq!(engine.session().time_left_secs, 25 * 60 - 1);
    }

    #[test]
    fn idle_ticks_do_nothing() {
        let mut engine = TimerEngine::default();
        assert!(run_ticks(&mut engine, 100).is_empty());
        assert_eq!(engine.session().time_left_secs, 25 * 60);
    }

    #[test]
    fn focus_completion_enters_break_idle() {
        let mut engine = TimerEngine::new(Durations::new(1, 2).unwrap());
        engine.start();
        let events = run_ticks(&mut engine, 60);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::SessionComplete {
                sessions_completed: 1,
                work_minutes: 1,
                break_minutes: 2,
                ..
            }
        ));
        assert_eq!(engine.state(), TimerState::BreakIdle);
        assert_eq!(engine.session().time_left_secs, 120);
    }

    #[test]
    fn break_completion_returns_to_focus_idle() {
        let mut engine = TimerEngine::new(Durations::new(1, 1).unwrap());
        engine.start();
        run_ticks(&mut engine, 60);
        engine.start();
        let events = run_ticks(&mut engine, 60);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::BreakOver { .. }));
        assert_eq!(engine.state(), TimerState::FocusIdle);
        assert_eq!(engine.session().time_left_secs, 60);
        assert_eq!(engine.session().sessions_completed, 1);
    }

    #[test]
    fn reset_discards_break() {
        let mut engine = TimerEngine::new(Durations::new(1, 5).unwrap());
        engine.start();
        run_ticks(&mut engine, 60);
        assert_eq!(engine.phase(), Phase::Break);
        engine.reset();
        assert_eq!(engine.state(), TimerState::FocusIdle);
        assert_eq!(engine.session().time_left_secs, 60);
        assert_eq!(engine.session().sessions_completed, 1);
    }

    #[test]
    fn skip_break_during_focus_restarts_focus() {
        let mut engine = TimerEngine::default();
        engine.start();
        run_ticks(&mut engine, 30);
        let ev = engine.skip_break().unwrap();
        assert!(matches!(
            ev,
            Event::BreakSkipped {
                from_phase: Phase::Focus,
                ..
            }
        ));
        assert_eq!(engine.state(), TimerState::FocusIdle);
        assert_eq!(engine.session().time_left_secs, 25 * 60);
    }

    #[test]
    fn set_durations_clobbers_partial_countdown() {
        let mut engine = TimerEngine::new(Durations::new(1, 5).unwrap());
        engine.start();
        run_ticks(&mut engine, 50);
        assert_eq!(engine.session().time_left_secs, 10);
        engine.set_durations(30, 10).unwrap();
        assert_eq!(engine.session().time_left_secs, 30 * 60);
        assert!(engine.session().is_active);
    }

    #[test]
    fn set_durations_during_break_uses_break_length() {
        let mut engine = TimerEngine::new(Durations::new(1, 5).unwrap());
        engine.start();
        run_ticks(&mut engine, 60);
        engine.set_durations(40, 8).unwrap();
        assert_eq!(engine.session().time_left_secs, 8 * 60);
    }

    #[test]
    fn set_durations_rejects_zero_and_keeps_state() {
        let mut engine = TimerEngine::default();
        assert!(engine.set_durations(0, 5).is_err());
        assert_eq!(engine.session().work_minutes, 25);
        assert_eq!(engine.session().time_left_secs, 25 * 60);
    }

    #[test]
    fn restore_keeps_counters_not_countdown() {
        let snapshot = SessionSnapshot {
            user_id: "u".into(),
            sessions_completed: 7,
            work_minutes: 45,
            break_minutes: 15,
            is_active: true,
            updated_at: Utc::now(),
        };
        let engine = TimerEngine::restore(&snapshot);
        assert_eq!(engine.state(), TimerState::FocusIdle);
        assert_eq!(engine.session().sessions_completed, 7);
        assert_eq!(engine.session().time_left_secs, 45 * 60);
        assert_eq!(engine.session().break_minutes, 15);
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let engine = TimerEngine::default();
        match engine.snapshot() {
            Event::StateSnapshot { state, session, .. } => {
                assert_eq!(state, TimerState::FocusIdle);
                assert_eq!(session.time_left_secs, 25 * 60);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
