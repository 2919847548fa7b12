//! SQLite-backed persistence.
//!
//! Provides persistent storage for:
//! - Per-user timer snapshots (`pomodoro_sessions`)
//! - Study tasks, exams and daily quotes
//!
//! Every successful mutation is also published on a broadcast channel so
//! in-process watchers can refresh without polling.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::{data_dir, SessionStore};
use crate::error::{CoreError, DatabaseError, Result};
use crate::timer::SessionSnapshot;

const CHANGE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    PomodoroSessions,
    StudyTasks,
    Exams,
    DailyQuotes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A row-level change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub id: String,
}

/// SQLite database for all persisted state.
pub struct Database {
    conn: Connection,
    changes: broadcast::Sender<ChangeEvent>,
}

/// A database shared between the CLI thread and runtime tasks.
pub type SharedDatabase = Arc<Mutex<Database>>;

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/studydesk.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("studydesk.db"))
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        let db = Self { conn, changes };
        db.migrate()?;
        Ok(db)
    }

    /// Wrap in the shared handle used by runtime tasks.
    pub fn into_shared(self) -> SharedDatabase {
        Arc::new(Mutex::new(self))
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS pomodoro_sessions (
                user_id            TEXT PRIMARY KEY,
                sessions_completed INTEGER NOT NULL DEFAULT 0,
                duration_minutes   INTEGER NOT NULL,
                break_minutes      INTEGER NOT NULL,
                is_active          INTEGER NOT NULL DEFAULT 0,
                created_at         TEXT NOT NULL,
                updated_at         TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS study_tasks (
                id            TEXT PRIMARY KEY,
                user_id       TEXT NOT NULL,
                subject_name  TEXT NOT NULL,
                description   TEXT,
                start_time    TEXT NOT NULL,
                end_time      TEXT NOT NULL,
                priority      TEXT NOT NULL DEFAULT 'medium',
                is_completed  INTEGER NOT NULL DEFAULT 0,
                alarm_enabled INTEGER NOT NULL DEFAULT 1,
                created_at    TEXT NOT NULL,
                updated_at    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS exams (
                id         TEXT PRIMARY KEY,
                user_id    TEXT NOT NULL,
                exam_name  TEXT NOT NULL,
                subject    TEXT NOT NULL,
                exam_date  TEXT NOT NULL,
                notes      TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS daily_quotes (
                id       TEXT PRIMARY KEY,
                quote    TEXT NOT NULL,
                author   TEXT NOT NULL,
                category TEXT,
                added_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_study_tasks_user_start ON study_tasks(user_id, start_time);
            CREATE INDEX IF NOT EXISTS idx_exams_user_date ON exams(user_id, exam_date);",
        )?;
        Ok(())
    }

    /// Subscribe to row-level change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    pub(crate) fn publish(&self, table: Table, kind: ChangeKind, id: &str) {
        // No subscribers is fine.
        let _ = self.changes.send(ChangeEvent {
            table,
            kind,
            id: id.to_string(),
        });
    }

    // ── Timer snapshots ──────────────────────────────────────────────

    /// Insert or replace the snapshot for `snapshot.user_id`.
    pub fn upsert_session(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let ts = snapshot.updated_at.to_rfc3339();
        let existed = self.load_session(&snapshot.user_id)?.is_some();
        self.conn.execute(
            "INSERT INTO pomodoro_sessions
                (user_id, sessions_completed, duration_minutes, break_minutes, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(user_id) DO UPDATE SET
                sessions_completed = excluded.sessions_completed,
                duration_minutes   = excluded.duration_minutes,
                break_minutes      = excluded.break_minutes,
                is_active          = excluded.is_active,
                updated_at         = excluded.updated_at",
            params![
                snapshot.user_id,
                snapshot.sessions_completed,
                snapshot.work_minutes,
                snapshot.break_minutes,
                snapshot.is_active,
                ts,
            ],
        )?;
        let kind = if existed {
            ChangeKind::Update
        } else {
            ChangeKind::Insert
        };
        self.publish(Table::PomodoroSessions, kind, &snapshot.user_id);
        Ok(())
    }

    pub fn load_session(&self, user_id: &str) -> Result<Option<SessionSnapshot>> {
        let row = self
            .conn
            .query_row(
                "SELECT user_id, sessions_completed, duration_minutes, break_minutes, is_active, updated_at
                 FROM pomodoro_sessions WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(SessionSnapshot {
                        user_id: row.get(0)?,
                        sessions_completed: row.get(1)?,
                        work_minutes: row.get(2)?,
                        break_minutes: row.get(3)?,
                        is_active: row.get(4)?,
                        updated_at: parse_ts(5, row.get(5)?)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}

impl SessionStore for Mutex<Database> {
    fn load(&self, user_id: &str) -> Result<Option<SessionSnapshot>> {
        self.lock()
            .map_err(|_| CoreError::Custom("database mutex poisoned".into()))?
            .load_session(user_id)
    }

    fn upsert(&self, snapshot: &SessionSnapshot) -> Result<()> {
        self.lock()
            .map_err(|_| CoreError::Custom("database mutex poisoned".into()))?
            .upsert_session(snapshot)
    }
}

/// Parse an RFC 3339 column into UTC.
pub(crate) fn parse_ts(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
