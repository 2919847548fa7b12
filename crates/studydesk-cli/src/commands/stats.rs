use chrono::Local;
use studydesk_core::DashboardStats;

use super::{open, CmdResult};

pub fn run(json: bool) -> CmdResult {
    let (config, db) = open()?;
    let user_id = config.profile.user_id.as_str();

    let tasks = db.list_tasks(user_id)?;
    let exams = db.list_exams(user_id)?;
    let sessions = db
        .load_session(user_id)?
        .map(|s| s.sessions_completed)
        .unwrap_or(0);
    let stats = DashboardStats::compute(&tasks, &exams, sessions, Local::now());

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Today's tasks:       {}", stats.today_tasks);
        println!("Completed tasks:     {}", stats.completed_tasks);
        println!("Upcoming exams:      {}", stats.upcoming_exams);
        println!("Pomodoros completed: {}", stats.sessions_completed);
    }
    Ok(())
}
