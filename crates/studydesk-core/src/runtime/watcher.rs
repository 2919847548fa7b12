//! Periodic alarm scanning over a caller-owned task list.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::periodic::PeriodicHandle;
use crate::alarm::{AlarmEvent, AlarmScanner, AlarmWindows, ScheduledTask};
use crate::notify::{
    AlarmDispatcher, NotificationPermission, Permission, Presenter, SystemNotifier,
};

const ALARM_CAPACITY: usize = 32;

/// Where alarms are delivered.
#[derive(Clone)]
pub struct AlarmSinks {
    pub permission: Arc<dyn NotificationPermission>,
    pub notifier: Arc<dyn SystemNotifier>,
    pub presenter: Arc<dyn Presenter>,
}

/// Handle to a running alarm loop. Dropping it stops the loop.
pub struct AlarmWatcher {
    alarms: broadcast::Sender<AlarmEvent>,
    task: PeriodicHandle,
}

impl AlarmWatcher {
    /// Scan immediately, then every `period`, and again whenever the task
    /// list changes. Permission is requested once up front if undetermined.
    pub fn spawn(
        windows: AlarmWindows,
        period: Duration,
        tasks: watch::Receiver<Vec<ScheduledTask>>,
        sinks: AlarmSinks,
    ) -> Self {
        let (alarms, _) = broadcast::channel(ALARM_CAPACITY);
        let task = PeriodicHandle::spawn(
            "alarms",
            run_watcher(windows, period, tasks, sinks, alarms.clone()),
        );
        Self { alarms, task }
    }

    /// Every alarm dispatched from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AlarmEvent> {
        self.alarms.subscribe()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        self.task.cancel();
    }
}

async fn run_watcher(
    windows: AlarmWindows,
    period: Duration,
    mut tasks: watch::Receiver<Vec<ScheduledTask>>,
    sinks: AlarmSinks,
    alarms: broadcast::Sender<AlarmEvent>,
) {
    if sinks.permission.query() == Permission::Undetermined {
        let answer = sinks.permission.request();
        info!(?answer, "notification permission requested");
    }

    let mut scanner = AlarmScanner::new(windows);
    // first tick completes immediately: the scan on mount
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut feed_open = true;

    info!(period_secs = period.as_secs(), "alarm watcher started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = tasks.changed(), if feed_open => {
                if changed.is_err() {
                    debug!("task feed closed; keeping last list");
                    feed_open = false;
                    continue;
                }
                ticker.reset();
            }
        }

        let snapshot = tasks.borrow_and_update().clone();
        let fired = scanner.scan(Utc::now(), &snapshot);
        if fired.is_empty() {
            continue;
        }
        let dispatcher = AlarmDispatcher::new(
            sinks.permission.as_ref(),
            sinks.notifier.as_ref(),
            sinks.presenter.as_ref(),
        );
        for alarm in fired {
            info!(task_id = %alarm.task_id, kind = ?alarm.kind, "alarm");
            dispatcher.dispatch(&alarm);
            let _ = alarms.send(alarm);
        }
    }
}
