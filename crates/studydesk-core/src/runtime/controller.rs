//! Drives a [`TimerEngine`] from a repeating tick and a command channel.
//!
//! The engine lives inside one spawned task. Ticks and commands are handled
//! in a single `select!` loop, so each runs to completion before the next
//! one is looked at. Hosts only ever see cloned [`TimerSession`] snapshots.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::periodic::PeriodicHandle;
use crate::error::ValidationError;
use crate::events::Event;
use crate::notify::{play_best_effort, Chime, Presenter, ToastKind};
use crate::storage::SessionStore;
use crate::timer::{Durations, SessionSnapshot, TimerEngine, TimerSession};

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Pause,
    Reset,
    SkipBreak,
    SetDurations { work_minutes: u32, break_minutes: u32 },
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct TimerSettings {
    pub user_id: String,
    pub durations: Durations,
    pub tick_period: Duration,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            user_id: "local".into(),
            durations: Durations::default(),
            tick_period: Duration::from_secs(1),
        }
    }
}

/// Collaborators the controller reports to.
#[derive(Clone)]
pub struct TimerCollaborators {
    pub store: Arc<dyn SessionStore>,
    pub presenter: Arc<dyn Presenter>,
    pub chime: Arc<dyn Chime>,
}

/// Handle to a running timer task.
pub struct TimerController {
    commands: mpsc::UnboundedSender<TimerCommand>,
    state: watch::Receiver<TimerSession>,
    events: broadcast::Sender<Event>,
    task: PeriodicHandle,
}

impl TimerController {
    /// Spawn the timer task. It loads the user's last snapshot once before
    /// handling any tick or command.
    pub fn spawn(settings: TimerSettings, collaborators: TimerCollaborators) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(TimerSession::fresh(settings.durations));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let task = PeriodicHandle::spawn(
            "timer",
            run_timer(settings, collaborators, rx, state_tx, events.clone()),
        );

        Self {
            commands,
            state,
            events,
            task,
        }
    }

    /// Latest published snapshot.
    pub fn state(&self) -> TimerSession {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<TimerSession> {
        self.state.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn start(&self) {
        self.send(TimerCommand::Start);
    }

    pub fn pause(&self) {
        self.send(TimerCommand::Pause);
    }

    pub fn reset(&self) {
        self.send(TimerCommand::Reset);
    }

    pub fn skip_break(&self) {
        self.send(TimerCommand::SkipBreak);
    }

    /// Validated here so the caller gets the error; the task applies it.
    pub fn set_durations(&self, work_minutes: u32, break_minutes: u32) -> Result<(), ValidationError> {
        Durations::new(work_minutes, break_minutes)?;
        self.send(TimerCommand::SetDurations {
            work_minutes,
            break_minutes,
        });
        Ok(())
    }

    /// Ask the task to stop and wait for it.
    pub async fn shutdown(self) {
        self.send(TimerCommand::Shutdown);
        self.task.join().await;
    }

    fn send(&self, cmd: TimerCommand) {
        if self.commands.send(cmd).is_err() {
            debug!(?cmd, "timer task already stopped");
        }
    }
}

async fn run_timer(
    settings: TimerSettings,
    collaborators: TimerCollaborators,
    mut commands: mpsc::UnboundedReceiver<TimerCommand>,
    state: watch::Sender<TimerSession>,
    events: broadcast::Sender<Event>,
) {
    let mut engine = match load_snapshot(&collaborators.store, &settings.user_id).await {
        Some(snapshot) => {
            info!(
                user_id = %settings.user_id,
                sessions_completed = snapshot.sessions_completed,
                "restored timer snapshot"
            );
            TimerEngine::restore(&snapshot)
        }
        None => TimerEngine::new(settings.durations),
    };
    state.send_replace(engine.session().clone());

    let period = settings.tick_period;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let event = tokio::select! {
            cmd = commands.recv() => {
                let Some(cmd) = cmd else { break };
                match apply(&mut engine, cmd) {
                    Apply::Stop => break,
                    Apply::Event(ev) => {
                        if matches!(ev, Some(Event::TimerStarted { .. })) {
                            // first decrement lands one full period after start
                            ticker.reset();
                        }
                        ev
                    }
                }
            }
            _ = ticker.tick() => engine.tick(),
        };

        state.send_replace(engine.session().clone());

        if let Some(event) = event {
            if event.is_completion() {
                on_completion(&event, &engine, &settings.user_id, &collaborators);
            }
            let _ = events.send(event);
        }
    }

    info!("timer task stopped");
}

enum Apply {
    Event(Option<Event>),
    Stop,
}

fn apply(engine: &mut TimerEngine, cmd: TimerCommand) -> Apply {
    let event = match cmd {
        TimerCommand::Start => engine.start(),
        TimerCommand::Pause => engine.pause(),
        TimerCommand::Reset => engine.reset(),
        TimerCommand::SkipBreak => engine.skip_break(),
        TimerCommand::SetDurations {
            work_minutes,
            break_minutes,
        } => match engine.set_durations(work_minutes, break_minutes) {
            Ok(ev) => ev,
            Err(e) => {
                warn!("ignoring durations: {e}");
                None
            }
        },
        TimerCommand::Shutdown => return Apply::Stop,
    };
    Apply::Event(event)
}

fn on_completion(
    event: &Event,
    engine: &TimerEngine,
    user_id: &str,
    collaborators: &TimerCollaborators,
) {
    info!(?event, "phase complete");
    if let Some(message) = event.completion_message() {
        collaborators
            .presenter
            .show_transient(ToastKind::Success, message, None);
    }
    if matches!(event, Event::SessionComplete { .. }) {
        persist(engine.to_snapshot(user_id), collaborators);
    }
    play_best_effort(collaborators.chime.as_ref());
}

/// Fire-and-forget upsert. The outcome is only logged and shown.
fn persist(mut snapshot: SessionSnapshot, collaborators: &TimerCollaborators) {
    snapshot.is_active = false;
    let store = Arc::clone(&collaborators.store);
    let presenter = Arc::clone(&collaborators.presenter);
    tokio::spawn(async move {
        let user_id = snapshot.user_id.clone();
        let result = tokio::task::spawn_blocking(move || store.upsert(&snapshot)).await;
        match result {
            Ok(Ok(())) => debug!(%user_id, "session snapshot saved"),
            Ok(Err(e)) => {
                error!(%user_id, "failed to save session: {e}");
                presenter.show_transient(
                    ToastKind::Error,
                    "Failed to save session",
                    Some(&e.to_string()),
                );
            }
            Err(e) => error!(%user_id, "session save task failed: {e}"),
        }
    });
}

async fn load_snapshot(store: &Arc<dyn SessionStore>, user_id: &str) -> Option<SessionSnapshot> {
    let store = Arc::clone(store);
    let user = user_id.to_string();
    match tokio::task::spawn_blocking(move || store.load(&user)).await {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(e)) => {
            warn!(%user_id, "could not load timer snapshot: {e}");
            None
        }
        Err(e) => {
            warn!(%user_id, "snapshot load task failed: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{RecordingChime, RecordingPresenter};
    use crate::storage::MemorySessionStore;
    use crate::timer::TimerState;

    struct Rig {
        store: Arc<MemorySessionStore>,
        presenter: Arc<RecordingPresenter>,
        chime: Arc<RecordingChime>,
    }

    impl Rig {
        fn new(store: MemorySessionStore) -> Self {
            Self {
                store: Arc::new(store),
                presenter: Arc::new(RecordingPresenter::default()),
                chime: Arc::new(RecordingChime::failing()),
            }
        }

        fn spawn(&self, work: u32, brk: u32) -> TimerController {
            TimerController::spawn(
                TimerSettings {
                    user_id: "u1".into(),
                    durations: Durations::new(work, brk).unwrap(),
                    tick_period: Duration::from_secs(1),
                },
                TimerCollaborators {
                    store: self.store.clone(),
                    presenter: self.presenter.clone(),
                    chime: self.chime.clone(),
                },
            )
        }
    }

    async fn next_completion(rx: &mut broadcast::Receiver<Event>) -> Event {
        loop {
            let ev = rx.recv().await.unwrap();
            if ev.is_completion() {
                return ev;
            }
        }
    }

    async fn settle(mut done: impl FnMut() -> bool) {
        for _ in 0..200 {
            if done() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn focus_phase_completes_and_persists_once() {
        let rig = Rig::new(MemorySessionStore::new());
        let timer = rig.spawn(1, 1);
        let mut events = timer.subscribe();

        timer.start();
        let ev = next_completion(&mut events).await;
        assert!(matches!(
            ev,
            Event::SessionComplete {
                sessions_completed: 1,
                ..
            }
        ));

        let s = timer.state();
        assert_eq!(s.state(), TimerState::BreakIdle);
        assert_eq!(s.time_left_secs, 60);

        settle(|| rig.store.writes() == 1).await;
        assert_eq!(rig.store.writes(), 1);
        let saved = rig.store.load("u1").unwrap().unwrap();
        assert_eq!(saved.sessions_completed, 1);
        assert!(!saved.is_active);

        assert_eq!(rig.chime.plays(), 1);
        let toasts = rig.presenter.shown();
        assert_eq!(toasts[0].0, ToastKind::Success);
        assert_eq!(toasts[0].1, "Great job! Take a break!");
        timer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn break_completion_does_not_persist() {
        let rig = Rig::new(MemorySessionStore::new());
        let timer = rig.spawn(1, 1);
        let mut events = timer.subscribe();

        timer.start();
        next_completion(&mut events).await;
        timer.start();
        let ev = next_completion(&mut events).await;
        assert!(matches!(ev, Event::BreakOver { .. }));
        assert_eq!(timer.state().state(), TimerState::FocusIdle);

        settle(|| rig.store.writes() >= 1).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(rig.store.writes(), 1);
        timer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_save_keeps_local_state_and_reports() {
        let rig = Rig::new(MemorySessionStore::failing());
        let timer = rig.spawn(1, 1);
        let mut events = timer.subscribe();

        timer.start();
        next_completion(&mut events).await;
        settle(|| rig.presenter.shown().len() >= 2).await;

        assert_eq!(timer.state().sessions_completed, 1);
        let toasts = rig.presenter.shown();
        assert!(toasts
            .iter()
            .any(|(kind, msg, _)| *kind == ToastKind::Error && msg == "Failed to save session"));
        timer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn restores_counters_from_store() {
        let rig = Rig::new(MemorySessionStore::with_snapshot(SessionSnapshot {
            user_id: "u1".into(),
            sessions_completed: 6,
            work_minutes: 50,
            break_minutes: 10,
            is_active: false,
            updated_at: chrono::Utc::now(),
        }));
        let timer = rig.spawn(25, 5);
        let mut watch = timer.watch();
        settle(|| watch.borrow_and_update().sessions_completed == 6).await;

        let s = timer.state();
        assert_eq!(s.sessions_completed, 6);
        assert_eq!(s.work_minutes, 50);
        assert_eq!(s.time_left_secs, 50 * 60);
        timer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_countdown() {
        let rig = Rig::new(MemorySessionStore::new());
        let timer = rig.spawn(1, 1);
        timer.start();
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        timer.pause();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let left = timer.state().time_left_secs;
        assert_eq!(left, 50);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(timer.state().time_left_secs, left);
        timer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_start_while_running_keeps_counting() {
        let rig = Rig::new(MemorySessionStore::new());
        let timer = rig.spawn(1, 1);
        timer.start();
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(900)).await;
            timer.start();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        // 9.01s since the first start: nine whole periods
        assert_eq!(timer.state().time_left_secs, 51);
        assert!(timer.state().is_active);
        timer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn set_durations_validates_before_sending() {
        let rig = Rig::new(MemorySessionStore::new());
        let timer = rig.spawn(25, 5);
        assert!(timer.set_durations(0, 5).is_err());
        timer.set_durations(30, 10).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(timer.state().time_left_secs, 30 * 60);
        timer.shutdown().await;
    }
}
