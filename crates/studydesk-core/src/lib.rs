//! # Studydesk Core Library
//!
//! Business logic for the Studydesk study planner: a Pomodoro focus timer,
//! study-task alarms, exam countdowns and a daily quote. The CLI binary is a
//! thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: an event-counted focus/break state machine; the caller
//!   invokes `tick()` once per second
//! - **Alarm Scanner**: a pure scan of the task list that nudges once per task
//! - **Runtime**: tokio tasks that drive both on repeating triggers
//! - **Storage**: SQLite persistence with change notifications, TOML config
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`AlarmScanner`]: Pre-alert / start notifications for study tasks
//! - [`TimerController`] / [`AlarmWatcher`]: periodic drivers
//! - [`Database`]: Sessions, tasks, exams, quotes
//! - [`Config`]: Application configuration management

pub mod alarm;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod notify;
pub mod runtime;
pub mod storage;
pub mod timer;

pub use alarm::{AlarmEvent, AlarmKind, AlarmScanner, AlarmWindows, ScheduledTask};
pub use dashboard::{DashboardStats, ExamCountdown, Urgency};
pub use error::{ConfigError, CoreError, DatabaseError, NotifyError, ValidationError};
pub use events::Event;
pub use runtime::{AlarmWatcher, TimerController};
pub use storage::{Config, Database, SessionStore};
pub use timer::{Durations, Phase, TimerEngine, TimerSession, TimerState};
