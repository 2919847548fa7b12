mod engine;
mod session;

pub use engine::TimerEngine;
pub use session::{
    Durations, Phase, SessionSnapshot, TimerSession, TimerState, DEFAULT_BREAK_MINUTES,
    DEFAULT_WORK_MINUTES,
};
