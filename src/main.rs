mod ui;

use crossterm::event::{self, Event};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use delve::build_info;
use delve::core::{GameConfig, GameError, GameResult};
use delve::persistence::SaveManager;
use delve::utils::logging::init_logging;
use delve::world::{Game, TableNames};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::process::ExitCode;
use ui::input::{map_key, Selection};

enum Launch {
    New(String),
    Load(String),
    /// Load the slot if it exists, otherwise start a new game in it.
    Continue(String),
}

/// Restores the terminal however the game loop exits.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = self.terminal.backend_mut().execute(LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

fn print_help() {
    println!("Delve - terminal turn-based dungeon RPG\n");
    println!("Usage: delve [command] [slot]\n");
    println!("Commands:");
    println!("  new [SLOT]   Start a new game (default slot: main)");
    println!("  load [SLOT]  Load a saved game");
    println!("  slots        List save slots");
    println!("  restore SLOT Replace a slot with its newest good backup");
    println!("  --version    Show version information");
    println!("  --help       Show this help message");
    println!("\nSet DELVE_SAVE_DIR to change where games are saved.");
}

fn list_slots(config: &GameConfig) -> GameResult<()> {
    let slots = SaveManager::from_config(config).list_slots()?;
    if slots.is_empty() {
        println!("No saves in {}", config.save_dir.display());
        return Ok(());
    }
    for info in slots {
        if info.is_corrupted {
            println!("{:<16} [CORRUPTED]", info.slot);
            continue;
        }
        let saved = info
            .saved_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:<16} {:<16} {:>6} steps  {}",
            info.slot, info.player_name, info.steps, saved
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let config = GameConfig::load();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let slot_arg = |i: usize| {
        args.get(i)
            .cloned()
            .unwrap_or_else(|| config.default_slot.clone())
    };

    let launch = match args.first().map(String::as_str) {
        None => Launch::Continue(config.default_slot.clone()),
        Some("new") => Launch::New(slot_arg(1)),
        Some("load") => Launch::Load(slot_arg(1)),
        Some("slots") => {
            return match list_slots(&config) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("{}", e);
                    ExitCode::FAILURE
                }
            };
        }
        Some("restore") => {
            let slot = slot_arg(1);
            return match SaveManager::from_config(&config).restore_latest_backup(&slot) {
                Ok(world) => {
                    println!("Restored '{}' at {} steps.", slot, world.steps);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{}", e);
                    ExitCode::FAILURE
                }
            };
        }
        Some("--version") | Some("-v") => {
            println!("{}", build_info::version_line());
            return ExitCode::SUCCESS;
        }
        Some("--help") | Some("-h") => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Run 'delve --help' for usage.");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match init_logging(&config.log_dir) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        }
    };

    match run(&config, launch) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "exiting with error");
            eprintln!("{}", e);
            if matches!(e, GameError::CorruptRecord { .. }) {
                eprintln!("Run 'delve restore <slot>' to fall back to a backup.");
            }
            ExitCode::FAILURE
        }
    }
}

fn start(config: &GameConfig, launch: Launch) -> GameResult<Game> {
    let names = Box::new(TableNames::new(rand::random()));
    match launch {
        Launch::New(slot) => Ok(Game::new_game(config, names)?.with_slot(&slot)),
        Launch::Load(slot) => Game::load(config, &slot, names),
        Launch::Continue(slot) => match Game::load(config, &slot, names) {
            Err(GameError::NotFound { .. }) => {
                let names = Box::new(TableNames::new(rand::random()));
                Ok(Game::new_game(config, names)?.with_slot(&slot))
            }
            other => other,
        },
    }
}

fn run(config: &GameConfig, launch: Launch) -> GameResult<()> {
    let mut game = start(config, launch)?;
    let mut guard = TerminalGuard::new()?;
    let mut selection = Selection::default();
    let mut status: Option<String> = None;

    loop {
        let view = game.view()?;
        selection.clamp(&view);
        guard
            .terminal
            .draw(|frame| ui::draw(frame, &view, &selection, status.as_deref()))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        let Some(command) = map_key(key, &view, &mut selection) else {
            continue;
        };

        status = None;
        match game.handle(command) {
            Ok(()) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "command rejected");
                status = Some(e.to_string());
            }
        }
        if game.should_quit() {
            break;
        }
    }
    Ok(())
}
