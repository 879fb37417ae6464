use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::buffer::Buffer;
use ratatui::prelude::*;
use ratatui::widgets::*;

use super::centered;

/// Blocking yes/no question.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// Asks on the terminal: draws a popup over the last frame and waits for an answer.
pub struct TerminalConfirm<'t, B: Backend> {
    terminal: &'t mut Terminal<B>,
    backdrop: Buffer,
}

impl<'t, B: Backend> TerminalConfirm<'t, B> {
    pub fn new(terminal: &'t mut Terminal<B>, backdrop: Buffer) -> Self {
        TerminalConfirm { terminal, backdrop }
    }

    fn draw(&mut self, message: &str) -> std::io::Result<()> {
        let backdrop = &self.backdrop;
        self.terminal.draw(|frame| {
            if frame.area() == backdrop.area {
                frame.buffer_mut().merge(backdrop);
            }
            render_prompt(frame, message);
        })?;
        Ok(())
    }
}

impl<B: Backend> Confirm for TerminalConfirm<'_, B> {
    fn confirm(&mut self, message: &str) -> bool {
        if let Err(e) = self.draw(message) {
            tracing::warn!(error = %e, "confirmation prompt could not be drawn");
            return false;
        }

        loop {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => return true,
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => return false,
                    _ => {}
                },
                Ok(Event::Resize(_, _)) => {
                    if self.draw(message).is_err() {
                        return false;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "confirmation prompt lost its input");
                    return false;
                }
            }
        }
    }
}

fn render_prompt(frame: &mut Frame, message: &str) {
    let width = (message.chars().count() as u16 + 6).max(30);
    let area = centered(frame.area(), width, 5);

    let prompt = Paragraph::new(vec![
        Line::from(message.to_string()),
        Line::from(Span::styled(
            "y/Enter: confirm | n/Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Confirm")
            .border_style(Style::default().fg(Color::Red)),
    )
    .wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(prompt, area);
}
