use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use std::io;

mod config;
mod service;
mod storage;
mod telemetry;
mod tui;

use config::AppConfig;
use tui::app::App;
use tui::confirm::TerminalConfirm;

fn main() -> Result<()> {
    let config = AppConfig::parse();
    telemetry::init_tracing(&config);

    // Open the store before touching the terminal so failures print normally.
    let mut app = App::new(&config)?;

    // Setup terminal
    enable_raw_mode().map_err(|e| anyhow::anyhow!("Failed to enable raw mode: {}. Make sure you're running in a terminal.", e))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).map_err(|e| anyhow::anyhow!("Failed to enter alternate screen: {}. Make sure you're running in a terminal.", e))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| anyhow::anyhow!("Failed to create terminal: {}. Make sure you're running in a terminal.", e))?;

    let result = run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        tracing::error!(error = %e, "memopad exited with an error");
    }
    result
}

fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    while !app.should_quit {
        let backdrop = terminal.draw(|f| app.render(f))?.buffer.clone();

        let event = event::read()?;
        let mut confirm = TerminalConfirm::new(terminal, backdrop);
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                app.handle_key(key.code, key.modifiers, &mut confirm)?;
            }
            Event::Mouse(mouse) => app.handle_mouse(mouse, &mut confirm)?,
            _ => {}
        }
    }
    Ok(())
}
