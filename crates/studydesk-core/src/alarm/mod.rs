//! Study-task alarms: a periodic scan that nudges the user once per task
//! shortly before, or right at, its scheduled start.

mod scanner;

pub use scanner::{
    classify, AlarmEvent, AlarmKind, AlarmScanner, AlarmWindows, NotifiedSet, ScheduledTask,
};
