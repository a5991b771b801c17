//! Binary entrypoint for the escaperoom CLI.
//!
//! Commands:
//! - `init` - write a starter `escaperoom.toml`
//! - `author <draft.toml>` - build a room from a draft file and save it
//! - `rooms` - list saved rooms
//! - `show <code>` - print one room
//! - `play <code> [--time-limit <secs>]` - play a room in the terminal
//!
//! See the library crate docs for module-level details: `escaperoom::`.
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use escaperoom::config::Config;
use escaperoom::escape::commands::PLAY_HELP;
use escaperoom::escape::{
    Countdown, EscapeError, GameplayEngine, PlayShell, RoomDraft, RoomEditor, SharedStore,
    SledStore,
};

#[derive(Parser)]
#[command(name = "escaperoom")]
#[command(about = "Author and play escape-room puzzles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "escaperoom.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Build a room from a draft file and save it
    Author {
        /// Draft file describing icons and questions
        draft: PathBuf,
        /// Author name (defaults to the draft's author, then the config)
        #[arg(short, long)]
        author: Option<String>,
    },
    /// List saved rooms
    Rooms,
    /// Print a saved room
    Show {
        code: String,
    },
    /// Play a saved room
    Play {
        code: String,
        /// Countdown in seconds (overrides config)
        #[arg(short, long)]
        time_limit: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        info!("Writing default configuration to {}", cli.config);
        Config::create_default(&cli.config).await?;
        println!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let config = Config::load_or_default(&cli.config).await?;
    init_logging(&Some(config.clone()), cli.verbose);
    let store: SharedStore = Arc::new(SledStore::open(&config.storage.data_dir)?);
    let registry = config.registry.registry(store.clone());

    match cli.command {
        Commands::Init => {}
        Commands::Author { draft, author } => {
            let draft = RoomDraft::load(&draft)?;
            let author = author
                .or_else(|| draft.author.clone())
                .unwrap_or_else(|| config.editor.default_author.clone());
            let editor = RoomEditor::with_rules(store.clone(), author, config.editor.rules())
                .with_registry(config.registry.registry(store.clone()));
            draft.apply(&editor)?;
            match editor.validate_and_save() {
                Ok(room) => {
                    println!("Room saved. Code: {}", room.room_code);
                    editor.clear();
                }
                Err(EscapeError::Validation(violations)) => {
                    println!("Room not saved:");
                    for v in &violations {
                        println!("  - {}", v);
                    }
                    return Err(anyhow!("{} validation rule(s) failed", violations.len()));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Rooms => {
            let rooms = registry.list();
            if rooms.is_empty() {
                println!("No rooms saved yet.");
            }
            for room in rooms {
                println!(
                    "{}  {} icons  by {}  {}",
                    room.room_code,
                    room.icon_layout.len(),
                    room.created_by,
                    room.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Commands::Show { code } => {
            let room = registry
                .find_by_code(&code)
                .ok_or_else(|| anyhow!("Room {} not found", code))?;
            println!("{}", serde_json::to_string_pretty(&room)?);
        }
        Commands::Play { code, time_limit } => {
            let engine = match GameplayEngine::load(
                store.clone(),
                &registry,
                &code,
                config.gameplay.settings(),
            ) {
                Ok(engine) => engine,
                Err(EscapeError::NotFound(_)) => {
                    println!("Room {} not found.", code);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            let limit = time_limit.or(config.gameplay.time_limit_secs);
            play(engine, limit).await?;
        }
    }

    Ok(())
}

async fn play(engine: GameplayEngine, time_limit: Option<u64>) -> Result<()> {
    let mut shell = PlayShell::new(engine);
    if let Some(secs) = time_limit {
        shell = shell.with_countdown_source(move || {
            Countdown::start(Duration::from_secs(secs), Duration::from_secs(60), |left| {
                if left.is_zero() {
                    println!("\n*** Time is up! ***");
                } else {
                    info!("{}s left", left.as_secs());
                }
            })
        });
    }

    println!("{}\n", PLAY_HELP);
    println!("{}", shell.handle_line("look").text);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        let reply = shell.handle_line(&line);
        println!("{}", reply.text);
        if reply.quit {
            break;
        }
        if let Some(wait) = shell.engine().win_due_in(chrono::Utc::now()) {
            tokio::time::sleep(wait.to_std().unwrap_or_default()).await;
            if let Some(win) = shell.poll_win() {
                println!("*** You escaped room {}! ***", win.room_code);
                break;
            }
            warn!("Win signal not ready after waiting");
        }
    }
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level_filter())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let file = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Mirror to the console only when attached to a terminal.
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = file.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
