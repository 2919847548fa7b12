//! Study task rows.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::database::{parse_ts, ChangeKind, Database, Table};
use crate::alarm::ScheduledTask;
use crate::error::{DatabaseError, Result, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ValidationError::InvalidValue {
                field: "priority".into(),
                message: format!("expected low, medium or high, got '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyTask {
    pub id: String,
    pub user_id: String,
    pub subject_name: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub priority: Priority,
    pub is_completed: bool,
    pub alarm_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&StudyTask> for ScheduledTask {
    fn from(task: &StudyTask) -> Self {
        ScheduledTask {
            id: task.id.clone(),
            start_time: task.start_time,
            alarm_enabled: task.alarm_enabled,
            is_completed: task.is_completed,
            subject_name: task.subject_name.clone(),
        }
    }
}

/// Fields supplied when creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub subject_name: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_true")]
    pub alarm_enabled: bool,
}

/// Partial update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub subject_name: Option<String>,
    pub description: Option<Option<String>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub is_completed: Option<bool>,
    pub alarm_enabled: Option<bool>,
}

fn default_true() -> bool {
    true
}

fn check_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if end <= start {
        return Err(ValidationError::InvalidTimeRange { start, end });
    }
    Ok(())
}

fn check_subject(subject: &str) -> Result<(), ValidationError> {
    if subject.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "subject_name".into(),
            message: "must not be empty".into(),
        });
    }
    Ok(())
}

const TASK_COLUMNS: &str = "id, user_id, subject_name, description, start_time, end_time, \
                            priority, is_completed, alarm_enabled, created_at, updated_at";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<StudyTask> {
    let priority: String = row.get(6)?;
    Ok(StudyTask {
        id: row.get(0)?,
        user_id: row.get(1)?,
        subject_name: row.get(2)?,
        description: row.get(3)?,
        start_time: parse_ts(4, row.get(4)?)?,
        end_time: parse_ts(5, row.get(5)?)?,
        priority: priority.parse().map_err(|e: ValidationError| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?,
        is_completed: row.get(7)?,
        alarm_enabled: row.get(8)?,
        created_at: parse_ts(9, row.get(9)?)?,
        updated_at: parse_ts(10, row.get(10)?)?,
    })
}

impl Database {
    pub fn create_task(&self, user_id: &str, task: NewTask) -> Result<StudyTask> {
        check_subject(&task.subject_name)?;
        check_range(task.start_time, task.end_time)?;

        let now = Utc::now();
        let row = StudyTask {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            subject_name: task.subject_name,
            description: task.description,
            start_time: task.start_time,
            end_time: task.end_time,
            priority: task.priority,
            is_completed: false,
            alarm_enabled: task.alarm_enabled,
            created_at: now,
            updated_at: now,
        };
        self.conn().execute(
            &format!("INSERT INTO study_tasks ({TASK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"),
            params![
                row.id,
                row.user_id,
                row.subject_name,
                row.description,
                row.start_time.to_rfc3339(),
                row.end_time.to_rfc3339(),
                row.priority.as_str(),
                row.is_completed,
                row.alarm_enabled,
                row.created_at.to_rfc3339(),
                row.updated_at.to_rfc3339(),
            ],
        )?;
        self.publish(Table::StudyTasks, ChangeKind::Insert, &row.id);
        Ok(row)
    }

    pub fn get_task(&self, id: &str) -> Result<Option<StudyTask>> {
        let task = self
            .conn()
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM study_tasks WHERE id = ?1"),
                params![id],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    /// All of a user's tasks, earliest start first.
    pub fn list_tasks(&self, user_id: &str) -> Result<Vec<StudyTask>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM study_tasks WHERE user_id = ?1 ORDER BY start_time ASC"
        ))?;
        let rows = stmt.query_map(params![user_id], task_from_row)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    pub fn update_task(&self, id: &str, patch: TaskPatch) -> Result<StudyTask> {
        let mut task = self.get_task(id)?.ok_or_else(|| DatabaseError::NotFound {
            table: "study_tasks",
            id: id.to_string(),
        })?;

        if let Some(subject) = patch.subject_name {
            check_subject(&subject)?;
            task.subject_name = subject;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(start) = patch.start_time {
            task.start_time = start;
        }
        if let Some(end) = patch.end_time {
            task.end_time = end;
        }
        check_range(task.start_time, task.end_time)?;
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(done) = patch.is_completed {
            task.is_completed = done;
        }
        if let Some(alarm) = patch.alarm_enabled {
            task.alarm_enabled = alarm;
        }
        task.updated_at = Utc::now();

        self.conn().execute(
            "UPDATE study_tasks SET subject_name = ?2, description = ?3, start_time = ?4,
                end_time = ?5, priority = ?6, is_completed = ?7, alarm_enabled = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                task.id,
                task.subject_name,
                task.description,
                task.start_time.to_rfc3339(),
                task.end_time.to_rfc3339(),
                task.priority.as_str(),
                task.is_completed,
                task.alarm_enabled,
                task.updated_at.to_rfc3339(),
            ],
        )?;
        self.publish(Table::StudyTasks, ChangeKind::Update, &task.id);
        Ok(task)
    }

    pub fn delete_task(&self, id: &str) -> Result<()> {
        let n = self
            .conn()
            .execute("DELETE FROM study_tasks WHERE id = ?1", params![id])?;
        if n == 0 {
            return Err(DatabaseError::NotFound {
                table: "study_tasks",
                id: id.to_string(),
            }
            .into());
        }
        self.publish(Table::StudyTasks, ChangeKind::Delete, id);
        Ok(())
    }
}
