use clap::{Subcommand, ValueEnum};
use studydesk_core::storage::{NewTask, Priority, StudyTask, TaskPatch};

use super::{local, open, parse_when, CmdResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Schedule a study task
    Add {
        /// Subject name
        subject: String,
        /// Start time, e.g. "2026-10-16 14:00"
        #[arg(long)]
        start: String,
        /// End time; defaults to start + --minutes
        #[arg(long, conflicts_with = "minutes")]
        end: Option<String>,
        /// Length in minutes when --end is not given
        #[arg(long, default_value = "60")]
        minutes: i64,
        /// low, medium or high
        #[arg(long, default_value = "medium")]
        priority: String,
        #[arg(long)]
        description: Option<String>,
        /// Do not raise alarms for this task
        #[arg(long)]
        no_alarm: bool,
    },
    /// List tasks, earliest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a task completed
    Done { id: String },
    /// Mark a task not completed
    Undo { id: String },
    /// Turn a task's alarm on or off
    Alarm {
        id: String,
        #[arg(value_enum)]
        state: Switch,
    },
    /// Delete a task
    Delete { id: String },
}

fn print_task(task: &StudyTask) {
    let check = if task.is_completed { "x" } else { " " };
    let bell = if task.alarm_enabled { "alarm" } else { "-" };
    println!(
        "[{check}] {}  {} -> {}  {:<6} {:<5} {}",
        task.id,
        local(task.start_time),
        local(task.end_time),
        task.priority,
        bell,
        task.subject_name
    );
    if let Some(desc) = &task.description {
        println!("      {desc}");
    }
}

pub fn run(action: TaskAction) -> CmdResult {
    let (config, db) = open()?;
    let user_id = config.profile.user_id.as_str();

    match action {
        TaskAction::Add {
            subject,
            start,
            end,
            minutes,
            priority,
            description,
            no_alarm,
        } => {
            let start_time = parse_when(&start)?;
            let end_time = match end {
                Some(end) => parse_when(&end)?,
                None => chrono::TimeDelta::try_minutes(minutes)
                    .and_then(|len| start_time.checked_add_signed(len))
                    .ok_or_else(|| format!("--minutes {minutes} is out of range"))?,
            };
            let task = db.create_task(
                user_id,
                NewTask {
                    subject_name: subject,
                    description,
                    start_time,
                    end_time,
                    priority: priority.parse::<Priority>()?,
                    alarm_enabled: !no_alarm,
                },
            )?;
            println!("Task created: {}", task.id);
        }
        TaskAction::List { json } => {
            let tasks = db.list_tasks(user_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks scheduled.");
            } else {
                tasks.iter().for_each(print_task);
            }
        }
        TaskAction::Done { id } => {
            let task = db.update_task(
                &id,
                TaskPatch {
                    is_completed: Some(true),
                    ..Default::default()
                },
            )?;
            println!("Completed: {}", task.subject_name);
        }
        TaskAction::Undo { id } => {
            let task = db.update_task(
                &id,
                TaskPatch {
                    is_completed: Some(false),
                    ..Default::default()
                },
            )?;
            println!("Reopened: {}", task.subject_name);
        }
        TaskAction::Alarm { id, state } => {
            let enabled = matches!(state, Switch::On);
            let task = db.update_task(
                &id,
                TaskPatch {
                    alarm_enabled: Some(enabled),
                    ..Default::default()
                },
            )?;
            println!(
                "Alarm {} for {}",
                if enabled { "on" } else { "off" },
                task.subject_name
            );
        }
        TaskAction::Delete { id } => {
            db.delete_task(&id)?;
            println!("Task deleted: {id}");
        }
    }
    Ok(())
}
