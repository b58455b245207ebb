pub mod output;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;

use crate::{
    analysis::AnalysisRequester,
    store::{FileKvStore, KvStore},
    timer::{
        engine::{FocusTimer, TimerMode},
        runner::{TerminalBell, TerminalSurface, TimerRunner},
    },
    tracker::{
        aggregate::chart_totals,
        entities::{DEFAULT_CATEGORIES, TimeCategory},
        log::TimeLog,
    },
    utils::{
        clock::DefaultClock,
        dir::create_application_default_path,
        format::format_minutes,
        logging::{enable_logging, CLI_PREFIX},
    },
};

use self::output::{analysis_lines, entry_lines, print_lines, summary_lines};

#[derive(Parser, Debug)]
#[command(name = "Timewise", version, long_about = None)]
#[command(about = "Personal time tracker with AI analysis and a focus timer", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Log time against a category")]
    Add {
        #[arg(long, short, help = "Category id, e.g. work or exercise")]
        category: String,
        #[arg(long, short, help = "Duration in minutes")]
        minutes: i64,
        #[arg(long = "description", short = 'e', default_value = "", help = "What the time went to")]
        description: String,
    },
    #[command(about = "Delete a logged entry by id")]
    Delete {
        #[arg(help = "Entry id as shown by the list command")]
        id: i64,
    },
    #[command(about = "List logged entries, newest first")]
    List,
    #[command(about = "Show the per-category time distribution")]
    Summary,
    #[command(about = "Ask the AI coach for an analysis of your time allocation")]
    Analyze,
    #[command(about = "Run a focus countdown. Finishing a work period advances to a break")]
    Timer {
        #[arg(long, short, value_enum, default_value_t = TimerMode::Work, help = "Period to count down")]
        mode: TimerMode,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = args.dir.map_or_else(create_application_default_path, Ok)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &dir, logging_level, args.log)?;

    let store: Arc<dyn KvStore> = Arc::new(FileKvStore::new(dir)?);

    match args.commands {
        Commands::Add {
            category,
            minutes,
            description,
        } => {
            let category = validate_category(&category)?;
            let mut log = TimeLog::load(store, DefaultClock::boxed());
            let entry = log.add_entry(category.id.to_string(), minutes, description);
            println!(
                "Logged {} against {} (entry {})",
                format_minutes(entry.duration_minutes),
                category.name,
                entry.id
            );
            Ok(())
        }
        Commands::Delete { id } => {
            let mut log = TimeLog::load(store, DefaultClock::boxed());
            log.delete_entry(id);
            Ok(())
        }
        Commands::List => {
            let log = TimeLog::load(store, DefaultClock::boxed());
            if log.entries().is_empty() {
                println!("No entries yet. Add one with `timewise add`.");
            } else {
                print_lines(&entry_lines(log.entries(), DEFAULT_CATEGORIES));
            }
            Ok(())
        }
        Commands::Summary => {
            let log = TimeLog::load(store, DefaultClock::boxed());
            let totals = chart_totals(log.entries(), DEFAULT_CATEGORIES);
            if totals.is_empty() {
                println!("Nothing to show yet. Log some time first.");
            } else {
                print_lines(&summary_lines(&totals));
            }
            Ok(())
        }
        Commands::Analyze => {
            let log = TimeLog::load(store, DefaultClock::boxed());
            let requester = AnalysisRequester::from_env();
            let analysis = requester
                .request_analysis(log.entries(), DEFAULT_CATEGORIES)
                .await?;
            print_lines(&analysis_lines(&analysis));
            Ok(())
        }
        Commands::Timer { mode } => run_timer(store, mode).await,
    }
}

/// The entry form is the one place category ids get checked; the log itself
/// stores whatever it is given.
fn validate_category(id: &str) -> Result<&'static TimeCategory> {
    match DEFAULT_CATEGORIES.iter().find(|c| c.id == id) {
        Some(category) => Ok(category),
        None => {
            let known = DEFAULT_CATEGORIES
                .iter()
                .map(|c| c.id)
                .collect::<Vec<_>>()
                .join(", ");
            bail!("Unknown category {id:?}. Known categories: {known}")
        }
    }
}

async fn run_timer(store: Arc<dyn KvStore>, mode: TimerMode) -> Result<()> {
    let mut engine = FocusTimer::load(store);
    engine.select_mode(mode);

    let shutdown_token = CancellationToken::new();
    tokio::spawn(detect_shutdown(shutdown_token.clone()));

    let runner = TimerRunner::new(
        engine,
        Box::new(TerminalBell),
        Box::new(TerminalSurface),
        shutdown_token,
        DefaultClock::boxed(),
    );

    let engine = runner.run().await?;
    println!();
    println!(
        "Completed pomodoros: {}. Up next: {}.",
        engine.completed_work_sessions(),
        engine.mode().label()
    );
    Ok(())
}

/// Detects signals sent to the process so the countdown loop can be torn
/// down instead of left ticking.
async fn detect_shutdown(cancelation: CancellationToken) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
    };
}
