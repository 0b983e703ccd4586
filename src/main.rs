mod app;
mod catalog;
mod config;
mod logging;
mod ui;

use std::io;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{Event, KeyCode, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{DefaultTerminal, Terminal};
use tracing::{debug, info, warn};

use crate::app::App;
use crate::catalog::{CancelHandle, LoadOutcome, Repository};

/// Guided incident-response workflows in the terminal.
#[derive(Parser)]
#[command(name = "firedrill", version, about)]
struct Cli {}

fn main() -> Result<()> {
    let _cli = Cli::parse();
    let start_time = Instant::now();

    // Config first so logging can honor the configured level.
    let loaded_config = config::load_config();

    let (session_id, _guard) = match logging::init(&loaded_config.config.logging.level) {
        Ok(ctx) => {
            logging::cleanup_old_logs(&ctx.log_directory);
            (Some(ctx.session_id), Some(ctx._guard))
        }
        Err(e) => {
            // Run without file logging rather than refusing to start.
            eprintln!("Warning: Failed to initialize logging: {}", e);
            (None, None)
        }
    };

    // Config loading ran before the subscriber existed, so re-surface any
    // failure now that it can reach the log file.
    if let config::ConfigLoadStatus::Error(ref message) = loaded_config.status {
        warn!(%message, "config_load_error");
    }
    debug!(
        config_path = %loaded_config.config_path.display(),
        status = ?loaded_config.status,
        "config_loaded"
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

    let repo = Repository::new(loaded_config.config.load_delay());
    let result = run_app(terminal, repo);

    // Restore terminal
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    if let Some(sid) = session_id {
        info!(
            session_id = %sid,
            duration_secs = start_time.elapsed().as_secs_f64(),
            "session_end"
        );
    }

    result
}

fn run_app(mut terminal: DefaultTerminal, repo: Repository) -> Result<()> {
    let mut app = App::new();

    // Kick off the one-time catalog load. The handle doubles as the
    // cancellation signal: dropping it aborts a still-pending load.
    let mut pending_load: Option<(Receiver<LoadOutcome>, CancelHandle)> = Some(repo.spawn_load());

    loop {
        // Single message handoff from the loader thread.
        if let Some((rx, _)) = &pending_load {
            match rx.try_recv() {
                Ok(outcome) => {
                    app.on_catalog_loaded(outcome);
                    pending_load = None;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => pending_load = None,
            }
        }

        terminal.draw(|f| ui::draw(f, &mut app))?;

        // Short poll so the spinner keeps animating while the load is pending.
        if crossterm::event::poll(Duration::from_millis(50))? {
            match crossterm::event::read()? {
                Event::Key(key) => match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.quit();
                    }
                    // Global quit from any stage, capturing included.
                    KeyCode::Char('q') => app.quit(),
                    KeyCode::Esc => app.cancel(),
                    KeyCode::Enter => app.confirm(),
                    KeyCode::Up => app.select_prev(),
                    KeyCode::Down => app.select_next(),
                    KeyCode::Backspace => app.backspace(),
                    KeyCode::Char(c) => app.key_char(c),
                    _ => {}
                },
                Event::Resize(_, _) => {
                    // Terminal resized, will be handled in next draw
                }
                _ => {}
            }
        }

        if app.should_quit {
            // Wake the loader thread if it is still waiting out its delay.
            if let Some((_, cancel)) = pending_load.take() {
                cancel.cancel();
            }
            return Ok(());
        }
    }
}
