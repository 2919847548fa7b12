//! tokio drivers for the timer and alarm loops.
//!
//! Both run as spawned tasks owned by handles; dropping a handle cancels its
//! task. Designed for a current-thread runtime, where the two loops and any
//! host commands interleave only at await points.

mod controller;
mod periodic;
mod watcher;

pub use controller::{TimerCollaborators, TimerCommand, TimerController, TimerSettings};
pub use periodic::PeriodicHandle;
pub use watcher::{AlarmSinks, AlarmWatcher};
