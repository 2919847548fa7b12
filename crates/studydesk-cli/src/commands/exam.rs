use chrono::Utc;
use clap::Subcommand;
use studydesk_core::dashboard::{upcoming_exams, ExamCountdown, Urgency};
use studydesk_core::storage::NewExam;

use super::{local, open, parse_when, CmdResult};

#[derive(Subcommand)]
pub enum ExamAction {
    /// Add an exam
    Add {
        /// Exam name
        name: String,
        #[arg(long)]
        subject: String,
        /// Date or date-time, e.g. "2026-12-01 09:00"
        #[arg(long)]
        date: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Countdown to upcoming exams
    List {
        /// Include every upcoming exam, not just the next three
        #[arg(long)]
        all: bool,
        /// Output as JSON (all exams, past included)
        #[arg(long)]
        json: bool,
    },
    /// Delete an exam
    Delete { id: String },
}

pub fn run(action: ExamAction) -> CmdResult {
    let (config, db) = open()?;
    let user_id = config.profile.user_id.as_str();

    match action {
        ExamAction::Add {
            name,
            subject,
            date,
            notes,
        } => {
            let exam = db.create_exam(
                user_id,
                NewExam {
                    exam_name: name,
                    subject,
                    exam_date: parse_when(&date)?,
                    notes,
                },
            )?;
            println!("Exam added: {}", exam.id);
        }
        ExamAction::List { all, json } => {
            let exams = db.list_exams(user_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&exams)?);
                return Ok(());
            }
            let now = Utc::now();
            let limit = if all { None } else { Some(3) };
            let upcoming = upcoming_exams(&exams, now, limit);
            if upcoming.is_empty() {
                println!("No upcoming exams. Add one to track!");
            }
            for exam in upcoming {
                let c = ExamCountdown::between(exam.exam_date, now);
                let flag = match c.urgency() {
                    Urgency::Critical => "!!",
                    Urgency::Soon => "! ",
                    Urgency::Normal => "  ",
                };
                println!(
                    "{flag} {:>3}d {:02}h {:02}m {:02}s  {} ({})  {}  [{}]",
                    c.days,
                    c.hours,
                    c.minutes,
                    c.seconds,
                    exam.exam_name,
                    exam.subject,
                    local(exam.exam_date),
                    exam.id
                );
            }
        }
        ExamAction::Delete { id } => {
            db.delete_exam(&id)?;
            println!("Exam deleted: {id}");
        }
    }
    Ok(())
}
