//! Read-only summaries shown on the dashboard: exam countdowns and counters.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{Exam, StudyTask};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    /// Three days or less.
    Critical,
    /// A week or less.
    Soon,
    Normal,
}

/// Time remaining until an exam, broken into display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamCountdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl ExamCountdown {
    /// All zero once `exam_date` is not in the future.
    pub fn between(exam_date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let diff = (exam_date - now).num_seconds();
        if diff <= 0 {
            return Self {
                days: 0,
                hours: 0,
                minutes: 0,
                seconds: 0,
            };
        }
        Self {
            days: diff / 86_400,
            hours: (diff % 86_400) / 3_600,
            minutes: (diff % 3_600) / 60,
            seconds: diff % 60,
        }
    }

    pub fn urgency(&self) -> Urgency {
        match self.days {
            d if d <= 3 => Urgency::Critical,
            d if d <= 7 => Urgency::Soon,
            _ => Urgency::Normal,
        }
    }
}

/// Exams strictly after `now`, soonest first, at most `limit` of them.
pub fn upcoming_exams(exams: &[Exam], now: DateTime<Utc>, limit: Option<usize>) -> Vec<&Exam> {
    let mut upcoming: Vec<&Exam> = exams.iter().filter(|e| e.exam_date > now).collect();
    upcoming.sort_by_key(|e| e.exam_date);
    if let Some(limit) = limit {
        upcoming.truncate(limit);
    }
    upcoming
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub today_tasks: usize,
    pub completed_tasks: usize,
    pub upcoming_exams: usize,
    pub sessions_completed: u32,
}

impl DashboardStats {
    /// "Today" is the calendar day of `now` in its own time zone.
    pub fn compute<Tz: TimeZone>(
        tasks: &[StudyTask],
        exams: &[Exam],
        sessions_completed: u32,
        now: DateTime<Tz>,
    ) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let now_utc = now.with_timezone(&Utc);
        Self {
            today_tasks: tasks
                .iter()
                .filter(|t| t.start_time.with_timezone(&tz).date_naive() == today)
                .count(),
            completed_tasks: tasks.iter().filter(|t| t.is_completed).count(),
            upcoming_exams: exams.iter().filter(|e| e.exam_date > now_utc).count(),
            sessions_completed,
        }
    }
}
