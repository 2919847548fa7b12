use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The fields of a study task the scanner reads. The task list itself is
/// owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub alarm_enabled: bool,
    pub is_completed: bool,
    pub subject_name: String,
}

/// Pre-alert lookahead and start grace period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmWindows {
    pub lead: Duration,
    pub grace: Duration,
}

impl Default for AlarmWindows {
    fn default() -> Self {
        Self {
            lead: Duration::minutes(5),
            grace: Duration::seconds(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlarmKind {
    PreAlert { minutes_remaining: i64 },
    Start,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmEvent {
    pub task_id: String,
    pub subject_name: String,
    #[serde(flatten)]
    pub kind: AlarmKind,
}

impl AlarmEvent {
    pub fn title(&self) -> String {
        match self.kind {
            AlarmKind::PreAlert { .. } => format!("📚 Upcoming: {}", self.subject_name),
            AlarmKind::Start => format!("🔔 Time to Study: {}", self.subject_name),
        }
    }

    pub fn body(&self) -> String {
        match self.kind {
            AlarmKind::PreAlert { minutes_remaining } => {
                format!("Starting in {minutes_remaining} minutes")
            }
            AlarmKind::Start => "Your study session is starting now!".to_string(),
        }
    }
}

/// Task ids already notified during this process lifetime. Never pruned.
#[derive(Debug, Clone, Default)]
pub struct NotifiedSet(HashSet<String>);

impl NotifiedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.0.contains(task_id)
    }

    /// Returns false if the id was already present.
    pub fn insert(&mut self, task_id: impl Into<String>) -> bool {
        self.0.insert(task_id.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Window arithmetic for `delta = start_time - now`.
///
/// `0 < delta <= lead` is a pre-alert; `-grace < delta <= 0` is the start.
pub fn classify(delta: Duration, windows: AlarmWindows) -> Option<AlarmKind> {
    if delta > Duration::zero() && delta <= windows.lead {
        let ms = delta.num_milliseconds();
        // ceil(ms / 60_000); sub-millisecond deltas still count as a minute
        let minutes_remaining = ((ms + 59_999) / 60_000).max(1);
        Some(AlarmKind::PreAlert { minutes_remaining })
    } else if delta <= Duration::zero() && delta > -windows.grace {
        Some(AlarmKind::Start)
    } else {
        None
    }
}

/// Emits at most one alarm per task for the lifetime of the scanner.
#[derive(Debug, Clone, Default)]
pub struct AlarmScanner {
    windows: AlarmWindows,
    notified: NotifiedSet,
}

impl AlarmScanner {
    pub fn new(windows: AlarmWindows) -> Self {
        Self {
            windows,
            notified: NotifiedSet::new(),
        }
    }

    pub fn windows(&self) -> AlarmWindows {
        self.windows
    }

    pub fn notified(&self) -> &NotifiedSet {
        &self.notified
    }

    /// Evaluate `tasks` at `now`, in list order.
    ///
    /// A task that fires is recorded in the notified set before the next task
    /// is looked at, so a pre-alerted task never also gets the start alarm.
    pub fn scan(&mut self, now: DateTime<Utc>, tasks: &[ScheduledTask]) -> Vec<AlarmEvent> {
        let mut fired = Vec::new();
        for task in tasks {
            if !task.alarm_enabled || task.is_completed || self.notified.contains(&task.id) {
                continue;
            }
            let Some(kind) = classify(task.start_time - now, self.windows) else {
                continue;
            };
            self.notified.insert(task.id.clone());
            fired.push(AlarmEvent {
                task_id: task.id.clone(),
                subject_name: task.subject_name.clone(),
                kind,
            });
        }
        debug!(
            tasks = tasks.len(),
            fired = fired.len(),
            notified = self.notified.len(),
            "alarm scan"
        );
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, start_time: DateTime<Utc>) -> ScheduledTask {
        ScheduledTask {
            id: id.into(),
            start_time,
            alarm_enabled: true,
            is_completed: false,
            subject_name: "Chemistry".into(),
        }
    }

    #[test]
    fn classify_boundaries() {
        let w = AlarmWindows::default();
        assert_eq!(classify(Duration::minutes(6), w), None);
        assert_eq!(
            classify(Duration::minutes(5), w),
            Some(AlarmKind::PreAlert {
                minutes_remaining: 5
            })
        );
        assert_eq!(
            classify(Duration::milliseconds(1), w),
            Some(AlarmKind::PreAlert {
                minutes_remaining: 1
            })
        );
        assert_eq!(
            classify(Duration::seconds(61), w),
            Some(AlarmKind::PreAlert {
                minutes_remaining: 2
            })
        );
        assert_eq!(classify(Duration::zero(), w), Some(AlarmKind::Start));
        assert_eq!(
            classify(Duration::milliseconds(-59_999), w),
            Some(AlarmKind::Start)
        );
        assert_eq!(classify(Duration::seconds(-60), w), None);
    }

    #[test]
    fn sub_millisecond_lead_counts_as_one_minute() {
        let kind = classify(Duration::nanoseconds(1), AlarmWindows::default());
        assert_eq!(
            kind,
            Some(AlarmKind::PreAlert {
                minutes_remaining: 1
            })
        );
        let alarm = AlarmEvent {
            task_id: "t".into(),
            subject_name: "Latin".into(),
            kind: kind.unwrap(),
        };
        assert_eq!(alarm.body(), "Starting in 1 minutes");
    }

    #[test]
    fn pre_alert_then_silence() {
        let start = Utc::now();
        let tasks = vec![task("t1", start)];
        let mut scanner = AlarmScanner::default();

        let first = scanner.scan(start - Duration::minutes(4), &tasks);
        assert_eq!(first.len(), 1);
        assert_eq!(
            first[0].kind,
            AlarmKind::PreAlert {
                minutes_remaining: 4
            }
        );
        assert_eq!(first[0].title(), "📚 Upcoming: Chemistry");
        assert_eq!(first[0].body(), "Starting in 4 minutes");

        assert!(scanner.scan(start, &tasks).is_empty());
    }

    #[test]
    fn start_fires_just_after_start_time() {
        let start = Utc::now();
        let tasks = vec![task("t1", start)];
        let mut scanner = AlarmScanner::default();
        let events = scanner.scan(start + Duration::milliseconds(1), &tasks);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlarmKind::Start);
        assert_eq!(events[0].body(), "Your study session is starting now!");
    }

    #[test]
    fn disabled_and_completed_tasks_never_fire() {
        let start = Utc::now();
        let mut off = task("off", start);
        off.alarm_enabled = false;
        let mut done = task("done", start);
        done.is_completed = true;
        let tasks = vec![off, done];
        let mut scanner = AlarmScanner::default();
        for offset in [-4, 0, 1] {
            assert!(scanner
                .scan(start + Duration::minutes(offset), &tasks)
                .is_empty());
        }
        assert!(scanner.notified().is_empty());
    }

    #[test]
    fn far_future_and_long_past_are_ignored() {
        let now = Utc::now();
        let tasks = vec![
            task("future", now + Duration::hours(2)),
            task("past", now - Duration::minutes(10)),
        ];
        let mut scanner = AlarmScanner::default();
        assert!(scanner.scan(now, &tasks).is_empty());
        assert!(scanner.notified().is_empty());
    }

    #[test]
    fn multiple_tasks_fire_in_list_order() {
        let now = Utc::now();
        let tasks = vec![
            task("a", now + Duration::minutes(3)),
            task("b", now - Duration::seconds(10)),
        ];
        let mut scanner = AlarmScanner::default();
        let events = scanner.scan(now, &tasks);
        let ids: Vec<_> = events.iter().map(|e| e.task_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn custom_windows_widen_lead() {
        let now = Utc::now();
        let tasks = vec![task("a", now + Duration::minutes(9))];
        let mut scanner = AlarmScanner::new(AlarmWindows {
            lead: Duration::minutes(10),
            grace: Duration::seconds(60),
        });
        let events = scanner.scan(now, &tasks);
        assert_eq!(
            events[0].kind,
            AlarmKind::PreAlert {
                minutes_remaining: 9
            }
        );
    }
}
