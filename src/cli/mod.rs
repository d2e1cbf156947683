pub mod commands;
pub mod render;
pub mod selector;
pub mod session;
pub mod shutdown;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{execute, HabitCommand};
use render::Renderer;
use session::run_session;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;

use crate::{
    habits::store::HabitStore,
    storage::file_store::FileStore,
    utils::{
        clock::LocalClock, dir::create_application_default_path, logging::enable_logging,
        runtime::single_thread_runtime,
    },
};

#[derive(Parser, Debug)]
#[command(name = "habitrack", version, long_about = None)]
#[command(about = "Track daily habits and keep your streaks going", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Option<Commands>,
    #[arg(
        long,
        global = true,
        env = "HABITRACK_DIR",
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Add a new habit")]
    Add {
        #[arg(required = true, num_args = 1.., help = "Name of the habit, e.g. Read 10 pages")]
        name: Vec<String>,
    },
    #[command(about = "Mark a habit done today, or undo it")]
    Toggle {
        #[arg(help = "List position, id, or the start of an id")]
        habit: String,
    },
    #[command(about = "Remove a habit")]
    Delete {
        #[arg(help = "List position, id, or the start of an id")]
        habit: String,
    },
    #[command(about = "Show all habits. This is the default")]
    List,
    #[command(about = "Show today's progress")]
    Progress,
    #[command(about = "Start an interactive session")]
    Session,
}

impl Commands {
    fn into_habit_command(self) -> Option<HabitCommand> {
        match self {
            Commands::Add { name } => Some(HabitCommand::Add(name.join(" "))),
            Commands::Toggle { habit } => Some(HabitCommand::Toggle(habit)),
            Commands::Delete { habit } => Some(HabitCommand::Delete(habit)),
            Commands::List => Some(HabitCommand::List),
            Commands::Progress => Some(HabitCommand::Progress),
            Commands::Session => None,
        }
    }
}

pub fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args.dir.map_or_else(create_application_default_path, Ok)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&app_dir.join("logs"), logging_level, args.log)?;

    let mut store = open_store(&app_dir)?;
    let renderer = Renderer::for_stdout();

    match args.commands.unwrap_or(Commands::List).into_habit_command() {
        Some(command) => execute(&mut store, command, &mut std::io::stdout().lock(), &renderer),
        None => {
            let runtime = single_thread_runtime()?;
            let token = CancellationToken::new();
            let result = runtime.block_on(async {
                tokio::spawn(shutdown::detect_shutdown(token.clone()));
                let mut stdout = std::io::stdout();
                run_session(
                    store,
                    tokio::io::stdin(),
                    &mut stdout,
                    &renderer,
                    token.clone(),
                )
                .await
            });
            // A pending stdin read would otherwise keep the runtime alive.
            runtime.shutdown_background();
            result
        }
    }
}

/// Opens the habit store kept under `app_dir`.
pub fn open_store(app_dir: &Path) -> Result<HabitStore<FileStore>> {
    let storage = FileStore::new(app_dir.join("data"))?;
    HabitStore::load(storage, Box::new(LocalClock))
}
