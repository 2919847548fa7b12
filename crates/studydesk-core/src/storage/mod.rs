mod config;
pub mod database;
mod exams;
mod memory;
mod quotes;
mod tasks;

pub use config::{AlarmsConfig, Config, ProfileConfig, SoundConfig, TimerConfig};
pub use database::{ChangeEvent, ChangeKind, Database, SharedDatabase, Table};
pub use exams::{Exam, ExamPatch, NewExam};
pub use memory::MemorySessionStore;
pub use quotes::{DailyQuote, NewQuote};
pub use tasks::{NewTask, Priority, StudyTask, TaskPatch};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};
use crate::timer::SessionSnapshot;

/// Returns the data directory, creating it if needed.
///
/// `STUDYDESK_HOME` overrides the location outright. Otherwise this is
/// `~/.config/studydesk/`, or `~/.config/studydesk-dev/` when
/// `STUDYDESK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("STUDYDESK_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDYDESK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studydesk-dev")
            } else {
                base_dir.join("studydesk")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Persistence collaborator for the timer: one snapshot per user,
/// last write wins.
pub trait SessionStore: Send + Sync {
    fn load(&self, user_id: &str) -> Result<Option<SessionSnapshot>>;
    fn upsert(&self, snapshot: &SessionSnapshot) -> Result<()>;
}
