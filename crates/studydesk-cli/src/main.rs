use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "studydesk", version, about = "Studydesk CLI: focus timer, study alarms, exams")]
struct Cli {
    /// Log at info level (overridden by STUDYDESK_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Focus timer
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Study task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Exam countdowns
    Exam {
        #[command(subcommand)]
        action: commands::exam::ExamAction,
    },
    /// Daily quote
    Quote {
        #[command(subcommand)]
        action: commands::quote::QuoteAction,
    },
    /// Study task alarms
    Alarms {
        #[command(subcommand)]
        action: commands::alarms::AlarmsAction,
    },
    /// Dashboard counters
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "studydesk=info,studydesk_core=info"
    } else {
        "studydesk=warn,studydesk_core=warn"
    };
    let filter = EnvFilter::try_from_env("STUDYDESK_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Exam { action } => commands::exam::run(action),
        Commands::Quote { action } => commands::quote::run(action),
        Commands::Alarms { action } => commands::alarms::run(action),
        Commands::Stats { json } => commands::stats::run(json),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
