use std::sync::Arc;

use chrono::Utc;
use clap::Subcommand;
use studydesk_core::alarm::{AlarmScanner, ScheduledTask};
use studydesk_core::notify::{
    AlarmDispatcher, ConfigPermission, ConsoleNotifier, ConsolePresenter, NotificationPermission,
    Permission,
};
use studydesk_core::runtime::{AlarmSinks, AlarmWatcher};
use studydesk_core::storage::{Config, Database};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{open, CmdResult};

#[derive(Subcommand)]
pub enum AlarmsAction {
    /// Scan once and raise any due alarms
    Check,
    /// Keep scanning until interrupted
    Watch,
}

fn scheduled(db: &Database, user_id: &str) -> studydesk_core::error::Result<Vec<ScheduledTask>> {
    Ok(db
        .list_tasks(user_id)?
        .iter()
        .map(ScheduledTask::from)
        .collect())
}

/// Re-read the table and publish it to the watcher only if it changed.
fn refresh_tasks(
    db: &Database,
    user_id: &str,
    tx: &watch::Sender<Vec<ScheduledTask>>,
) -> studydesk_core::error::Result<bool> {
    let tasks = scheduled(db, user_id)?;
    Ok(tx.send_if_modified(|current| {
        if *current == tasks {
            false
        } else {
            *current = tasks;
            true
        }
    }))
}

pub fn run(action: AlarmsAction) -> CmdResult {
    let (config, db) = open()?;
    if !config.alarms.enabled {
        println!("Alarms are disabled (alarms.enabled = false).");
        return Ok(());
    }

    match action {
        AlarmsAction::Check => {
            let permission = ConfigPermission::new(config.alarms.system_notifications);
            if permission.query() == Permission::Undetermined {
                permission.request();
            }
            let tasks = scheduled(&db, &config.profile.user_id)?;
            let mut scanner = AlarmScanner::new(config.alarm_windows());
            let fired = scanner.scan(Utc::now(), &tasks);
            let dispatcher = AlarmDispatcher::new(&permission, &ConsoleNotifier, &ConsolePresenter);
            for alarm in &fired {
                dispatcher.dispatch(alarm);
            }
            if fired.is_empty() {
                println!("No alarms due.");
            }
        }
        AlarmsAction::Watch => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(watch_alarms(config, db))?;
        }
    }
    Ok(())
}

async fn watch_alarms(config: Config, db: Database) -> CmdResult {
    let user_id = config.profile.user_id.clone();
    let (tx, rx) = watch::channel(scheduled(&db, &user_id)?);
    let sinks = AlarmSinks {
        permission: Arc::new(ConfigPermission::new(config.alarms.system_notifications)),
        notifier: Arc::new(ConsoleNotifier),
        presenter: Arc::new(ConsolePresenter),
    };
    let watcher = AlarmWatcher::spawn(config.alarm_windows(), config.scan_period(), rx, sinks);

    // Tasks are edited by other `studydesk` processes, whose writes never
    // reach this connection's change feed, so the table is polled.
    let mut refresh = tokio::time::interval(config.scan_period());
    refresh.tick().await;

    println!("Watching study task alarms. Press Ctrl+C to stop.");
    loop {
        tokio::select! {
            _ = refresh.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        match refresh_tasks(&db, &user_id, &tx) {
            Ok(true) => debug!("task list changed"),
            Ok(false) => {}
            Err(e) => warn!("refreshing tasks failed: {e}"),
        }
    }

    info!("alarm watch stopped");
    watcher.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use studydesk_core::storage::{NewTask, Priority};

    #[test]
    fn refresh_publishes_only_changes() {
        let db = Database::open_memory().unwrap();
        let (tx, mut rx) = watch::channel(scheduled(&db, "local").unwrap());
        assert!(!refresh_tasks(&db, "local", &tx).unwrap());

        let start = Utc::now() + Duration::minutes(3);
        db.create_task(
            "local",
            NewTask {
                subject_name: "Latin".into(),
                description: None,
                start_time: start,
                end_time: start + Duration::minutes(30),
                priority: Priority::Low,
                alarm_enabled: true,
            },
        )
        .unwrap();

        assert!(refresh_tasks(&db, "local", &tx).unwrap());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);
        assert!(!refresh_tasks(&db, "local", &tx).unwrap());
        assert!(!rx.has_changed().unwrap());
    }
}
