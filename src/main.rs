mod app;
mod config;
mod input;
mod persist;
mod sim;
mod ui;

use anyhow::{Context, Result};
use app::App;
use config::Config;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use input::{Command, Mailbox};
use persist::{load_game, save_game, save_in_background, slot_path};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use sim::format::format_number;
use sim::game::Game;
use sim::prestige::ResetKind;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const AUTOSAVE_EVERY: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config.log_file)?;

    let save_path = slot_path(&config.save_dir, config.slot);
    let mut game = match load_game(&save_path, &config.tuning)? {
        Some(state) => {
            info!(
                path = %save_path.display(),
                money = %format_number(state.money),
                layer = state.layer,
                "loaded save"
            );
            let mut game = Game::from_state(state, config.tuning.clone());
            game.add_message("The dream resumes where you left it.");
            game
        }
        None => {
            info!(path = %save_path.display(), "starting a new run");
            let mut game = Game::fresh(config.tuning.clone());
            game.add_message("You sit down at an empty desk. Press space to work.");
            game
        }
    };

    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, &mut game, &config, &save_path).await;
    restore_terminal(&mut terminal)?;

    save_game(&game.state, &save_path)?;
    info!("saved on exit");
    result
}

fn init_tracing(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("opening log file {}", log_file.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    game: &mut Game,
    config: &Config,
    save_path: &Path,
) -> Result<()> {
    let mut app = App::new();

    let mailbox = Arc::new(Mailbox::new());
    let producer = Arc::clone(&mailbox);
    task::spawn(async move {
        loop {
            match task::spawn_blocking(crossterm::event::read).await {
                Ok(Ok(event)) => {
                    producer.post(event);
                }
                Ok(Err(_)) => break,
                Err(_) => break,
            }
        }
    });

    let tick_rate = config.tick_rate();
    let mut last_tick = Instant::now();
    let mut last_save = Instant::now();
    let mut should_quit = false;

    loop {
        terminal.draw(|f| ui::render(f, &app, game))?;
        if should_quit {
            break;
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        tokio::select! {
            _ = mailbox.notified() => {
                if let Some(event) = mailbox.take() {
                    match handle_event(event, &mut app) {
                        Some(Command::Quit) => should_quit = true,
                        Some(Command::Save) => {
                            checkpoint(game, save_path);
                            last_save = Instant::now();
                            game.add_message("Saved.");
                        }
                        Some(command) => {
                            game.apply(&command, Instant::now());
                            checkpoint(game, save_path);
                            last_save = Instant::now();
                        }
                        None => {}
                    }
                }
            }
            _ = tokio::time::sleep(timeout) => {
                let delta = last_tick.elapsed();
                last_tick = Instant::now();
                game.tick(delta);
                if last_save.elapsed() >= AUTOSAVE_EVERY {
                    checkpoint(game, save_path);
                    last_save = Instant::now();
                }
            }
        }
    }

    Ok(())
}

fn checkpoint(game: &Game, save_path: &Path) {
    if !game.state.is_sane() {
        warn!("refusing to checkpoint a non-finite state");
        return;
    }
    save_in_background(game.state.clone(), PathBuf::from(save_path));
}

/// Navigation keys are handled here; everything else becomes a game command.
fn handle_event(event: Event, app: &mut App) -> Option<Command> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key_event(key, app),
        _ => None,
    }
}

fn handle_key_event(key: KeyEvent, app: &mut App) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char(' ') | KeyCode::Char('w') | KeyCode::Char('W') => Some(Command::Work),
        KeyCode::Char('a') | KeyCode::Char('A') => Some(Command::ToggleAuto),
        KeyCode::Char('f') | KeyCode::Char('F') => Some(Command::Focus),
        KeyCode::Char('h') | KeyCode::Char('H') => Some(Command::Reset(ResetKind::Inspiration)),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(Command::Reset(ResetKind::Concept)),
        KeyCode::Char('g') | KeyCode::Char('G') => Some(Command::Wager),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Command::Save),
        KeyCode::Enter | KeyCode::Char('b') | KeyCode::Char('B') => app.selected_command(),
        KeyCode::Tab | KeyCode::Right => {
            app.next_tab();
            None
        }
        KeyCode::BackTab | KeyCode::Left => {
            app.previous_tab();
            None
        }
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K') => {
            app.move_selection(-1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') => {
            app.move_selection(1);
            None
        }
        _ => None,
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
