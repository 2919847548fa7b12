use std::io::Write;
use std::sync::Arc;

use clap::Subcommand;
use studydesk_core::notify::{Chime, ConsolePresenter, SilentChime, TerminalBell};
use studydesk_core::runtime::{TimerCollaborators, TimerController, TimerSettings};
use studydesk_core::timer::{Durations, Phase, TimerEngine, TimerSession};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{open, CmdResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the focus timer in the foreground.
    ///
    /// Type a command and press enter: s = start, p = pause, r = reset,
    /// k = skip break, d <work> <break> = set durations, q = quit.
    Run,
    /// Print the stored timer snapshot as JSON
    Status,
    /// Set focus and break lengths in minutes
    Durations {
        work: u32,
        #[arg(value_name = "BREAK")]
        break_minutes: u32,
    },
}

enum Input {
    Start,
    Pause,
    Reset,
    SkipBreak,
    Durations(u32, u32),
    Quit,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let mut parts = line.split_whitespace();
    let cmd = parts.next().unwrap_or_default();
    match cmd {
        "s" | "start" => Ok(Input::Start),
        "p" | "pause" => Ok(Input::Pause),
        "r" | "reset" => Ok(Input::Reset),
        "k" | "skip" => Ok(Input::SkipBreak),
        "q" | "quit" => Ok(Input::Quit),
        "d" | "durations" => {
            let mut next = || -> Result<u32, String> {
                parts
                    .next()
                    .ok_or_else(|| "usage: d <work> <break>".to_string())?
                    .parse::<u32>()
                    .map_err(|e| e.to_string())
            };
            let work = next()?;
            let brk = next()?;
            Ok(Input::Durations(work, brk))
        }
        "" => Err("type s, p, r, k, d <work> <break> or q".into()),
        other => Err(format!("unknown command '{other}'")),
    }
}

fn render(session: &TimerSession) {
    let phase = match session.phase() {
        Phase::Focus => "Focus",
        Phase::Break => "Break",
    };
    let mark = if session.is_active { ">" } else { "||" };
    print!(
        "\r[{phase} {mark}] {}  sessions: {}   ",
        session.display(),
        session.sessions_completed
    );
    let _ = std::io::stdout().flush();
}

pub fn run(action: TimerAction) -> CmdResult {
    let (config, db) = open()?;
    let user_id = config.profile.user_id.clone();

    match action {
        TimerAction::Run => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let chime: Arc<dyn Chime> = if config.sound.enabled {
                Arc::new(TerminalBell)
            } else {
                Arc::new(SilentChime)
            };
            let settings = TimerSettings {
                user_id,
                durations: config.durations()?,
                tick_period: config.tick_period(),
            };
            let collaborators = TimerCollaborators {
                store: db.into_shared(),
                presenter: Arc::new(ConsolePresenter),
                chime,
            };
            let result = runtime.block_on(run_foreground(settings, collaborators));
            // A pending stdin read would otherwise hold shutdown open.
            runtime.shutdown_timeout(std::time::Duration::from_millis(500));
            result?;
        }
        TimerAction::Status => {
            let engine = match db.load_session(&user_id)? {
                Some(snapshot) => TimerEngine::restore(&snapshot),
                None => TimerEngine::new(config.durations()?),
            };
            println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
        }
        TimerAction::Durations {
            work,
            break_minutes,
        } => {
            let durations = Durations::new(work, break_minutes)?;
            let mut config = config;
            config.timer.work_minutes = durations.work_minutes();
            config.timer.break_minutes = durations.break_minutes();
            config.save()?;

            // Stored durations win over config on load, so keep them in step.
            if let Some(mut snapshot) = db.load_session(&user_id)? {
                snapshot.work_minutes = durations.work_minutes();
                snapshot.break_minutes = durations.break_minutes();
                snapshot.updated_at = chrono::Utc::now();
                db.upsert_session(&snapshot)?;
            }
            println!(
                "Durations set: focus {} min, break {} min",
                durations.work_minutes(),
                durations.break_minutes()
            );
        }
    }
    Ok(())
}

async fn run_foreground(settings: TimerSettings, collaborators: TimerCollaborators) -> CmdResult {
    let controller = TimerController::spawn(settings, collaborators);
    let mut state = controller.watch();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("s = start, p = pause, r = reset, k = skip break, d <work> <break>, q = quit");
    render(&controller.state());

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let session = state.borrow_and_update().clone();
                render(&session);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(line.trim()) {
                    Ok(Input::Start) => controller.start(),
                    Ok(Input::Pause) => controller.pause(),
                    Ok(Input::Reset) => controller.reset(),
                    Ok(Input::SkipBreak) => controller.skip_break(),
                    Ok(Input::Durations(work, brk)) => {
                        if let Err(e) = controller.set_durations(work, brk) {
                            println!("\n{e}");
                        }
                    }
                    Ok(Input::Quit) => break,
                    Err(msg) => println!("\n{msg}"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    println!();
    controller.shutdown().await;
    Ok(())
}
