use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::database::{parse_ts, ChangeKind, Database, Table};
use crate::error::{DatabaseError, Result, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    pub user_id: String,
    pub exam_name: String,
    pub subject: String,
    pub exam_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExam {
    pub exam_name: String,
    pub subject: String,
    pub exam_date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamPatch {
    pub exam_name: Option<String>,
    pub subject: Option<String>,
    pub exam_date: Option<DateTime<Utc>>,
    pub notes: Option<Option<String>>,
}

fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: field.into(),
            message: "must not be empty".into(),
        });
    }
    Ok(())
}

const EXAM_COLUMNS: &str = "id, user_id, exam_name, subject, exam_date, notes, created_at, updated_at";

fn exam_from_row(row: &Row<'_>) -> rusqlite::Result<Exam> {
    Ok(Exam {
        id: row.get(0)?,
        user_id: row.get(1)?,
        exam_name: row.get(2)?,
        subject: row.get(3)?,
        exam_date: parse_ts(4, row.get(4)?)?,
        notes: row.get(5)?,
        created_at: parse_ts(6, row.get(6)?)?,
        updated_at: parse_ts(7, row.get(7)?)?,
    })
}

impl Database {
    pub fn create_exam(&self, user_id: &str, exam: NewExam) -> Result<Exam> {
        require("exam_name", &exam.exam_name)?;
        require("subject", &exam.subject)?;

        let now = Utc::now();
        let row = Exam {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            exam_name: exam.exam_name,
            subject: exam.subject,
            exam_date: exam.exam_date,
            notes: exam.notes,
            created_at: now,
            updated_at: now,
        };
        self.conn().execute(
            &format!("INSERT INTO exams ({EXAM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                row.id,
                row.user_id,
                row.exam_name,
                row.subject,
                row.exam_date.to_rfc3339(),
                row.notes,
                row.created_at.to_rfc3339(),
                row.updated_at.to_rfc3339(),
            ],
        )?;
        self.publish(Table::Exams, ChangeKind::Insert, &row.id);
        Ok(row)
    }

    pub fn get_exam(&self, id: &str) -> Result<Option<Exam>> {
        let exam = self
            .conn()
            .query_row(
                &format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = ?1"),
                params![id],
                exam_from_row,
            )
            .optional()?;
        Ok(exam)
    }

    /// All of a user's exams, soonest first.
    pub fn list_exams(&self, user_id: &str) -> Result<Vec<Exam>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams WHERE user_id = ?1 ORDER BY exam_date ASC"
        ))?;
        let exams = stmt
            .query_map(params![user_id], exam_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(exams)
    }

    pub fn update_exam(&self, id: &str, patch: ExamPatch) -> Result<Exam> {
        let mut exam = self.get_exam(id)?.ok_or_else(|| DatabaseError::NotFound {
            table: "exams",
            id: id.to_string(),
        })?;
        if let Some(name) = patch.exam_name {
            require("exam_name", &name)?;
            exam.exam_name = name;
        }
        if let Some(subject) = patch.subject {
            require("subject", &subject)?;
            exam.subject = subject;
        }
        if let Some(date) = patch.exam_date {
            exam.exam_date = date;
        }
        if let Some(notes) = patch.notes {
            exam.notes = notes;
        }
        exam.updated_at = Utc::now();

        self.conn().execute(
            "UPDATE exams SET exam_name = ?2, subject = ?3, exam_date = ?4, notes = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                exam.id,
                exam.exam_name,
                exam.subject,
                exam.exam_date.to_rfc3339(),
                exam.notes,
                exam.updated_at.to_rfc3339(),
            ],
        )?;
        self.publish(Table::Exams, ChangeKind::Update, &exam.id);
        Ok(exam)
    }

    pub fn delete_exam(&self, id: &str) -> Result<()> {
        let n = self
            .conn()
            .execute("DELETE FROM exams WHERE id = ?1", params![id])?;
        if n == 0 {
            return Err(DatabaseError::NotFound {
                table: "exams",
                id: id.to_string(),
            }
            .into());
        }
        self.publish(Table::Exams, ChangeKind::Delete, id);
        Ok(())
    }
}
