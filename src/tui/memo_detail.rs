use crossterm::event::KeyCode;
use ratatui::buffer::Buffer;
use ratatui::layout::Position;
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::cell::Cell;

use super::confirm::Confirm;
use super::markdown::MarkdownRenderer;
use super::scroll::{ScrollGuard, ScrollLock};
use super::theme::{category_badge, tag_spans};
use super::{DELETE_PROMPT, MemoCallbacks, centered};
use crate::service::MemoError;
use crate::storage::Memo;

const CLOSE_LABEL: &str = "[x]";
const EDIT_LABEL: &str = "[ Edit ]";
const DELETE_LABEL: &str = "[ Delete ]";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailTarget {
    Backdrop,
    Panel,
    Close,
    Edit,
    Delete,
}

struct DetailRegions {
    panel: Rect,
    close: Rect,
    body: Rect,
    edit: Rect,
    delete: Rect,
}

fn regions(area: Rect) -> DetailRegions {
    let panel = centered(
        area,
        (area.width.saturating_mul(4) / 5).clamp(40.min(area.width), 100),
        area.height.saturating_mul(9) / 10,
    );
    let inner = Block::default().borders(Borders::ALL).inner(panel);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);
    let actions = rows[1];

    let close_width = CLOSE_LABEL.len() as u16;
    let close = Rect {
        x: panel.right().saturating_sub(close_width + 2),
        y: panel.y,
        width: close_width.min(panel.width),
        height: panel.height.min(1),
    };
    let delete_width = DELETE_LABEL.len() as u16;
    let delete = Rect {
        x: actions.right().saturating_sub(delete_width),
        width: delete_width.min(actions.width),
        ..actions
    };
    let edit_width = EDIT_LABEL.len() as u16;
    let edit = Rect {
        x: delete.x.saturating_sub(edit_width + 1).max(actions.x),
        width: edit_width.min(actions.width),
        ..actions
    };

    DetailRegions {
        panel,
        close,
        body: rows[0],
        edit,
        delete,
    }
}

/// Modal showing one memo in full.
///
/// Props follow the listing screen: `set_props` tells the view which memo to
/// show and whether it is open. The view never closes itself; it asks through
/// [`MemoCallbacks::on_close`] and waits for the props to change.
pub struct MemoDetail {
    memo: Option<Memo>,
    is_open: bool,
    scroll_lock: ScrollLock,
    scroll_guard: Option<ScrollGuard>,
    offset: u16,
    /// Largest useful offset as of the last render.
    max_offset: Cell<u16>,
}

impl MemoDetail {
    pub fn new(scroll_lock: ScrollLock) -> Self {
        MemoDetail {
            memo: None,
            is_open: false,
            scroll_lock,
            scroll_guard: None,
            offset: 0,
            max_offset: Cell::new(u16::MAX),
        }
    }

    pub fn set_props(&mut self, memo: Option<Memo>, is_open: bool) {
        if memo.as_ref().map(|m| &m.id) != self.memo.as_ref().map(|m| &m.id) {
            self.offset = 0;
        }
        self.memo = memo;
        self.is_open = is_open;

        // The listing stays still for as long as the modal is open.
        if is_open {
            if self.scroll_guard.is_none() {
                self.scroll_guard = Some(self.scroll_lock.acquire());
            }
        } else {
            self.scroll_guard = None;
            self.offset = 0;
        }
    }

    pub fn is_visible(&self) -> bool {
        self.is_open && self.memo.is_some()
    }

    pub fn scroll_by(&mut self, delta: i16) {
        self.offset = self
            .offset
            .saturating_add_signed(delta)
            .min(self.max_offset.get());
    }

    /// Handle a key while open. Returns whether the key was consumed.
    pub fn handle_key(
        &mut self,
        key: KeyCode,
        confirm: &mut dyn Confirm,
        callbacks: &mut dyn MemoCallbacks,
    ) -> Result<bool, MemoError> {
        if !self.is_open {
            return Ok(false);
        }

        match key {
            KeyCode::Esc => callbacks.on_close(),
            KeyCode::Char('e') => self.activate(DetailTarget::Edit, confirm, callbacks)?,
            KeyCode::Char('d') => self.activate(DetailTarget::Delete, confirm, callbacks)?,
            KeyCode::Char('j') | KeyCode::Down => self.scroll_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_by(-1),
            KeyCode::PageDown => self.scroll_by(10),
            KeyCode::PageUp => self.scroll_by(-10),
            _ => {}
        }
        Ok(true)
    }

    pub fn target_at(&self, area: Rect, column: u16, row: u16) -> Option<DetailTarget> {
        if !self.is_visible() {
            return None;
        }

        let position = Position::new(column, row);
        let regions = regions(area);
        let target = if regions.close.contains(position) {
            DetailTarget::Close
        } else if regions.edit.contains(position) {
            DetailTarget::Edit
        } else if regions.delete.contains(position) {
            DetailTarget::Delete
        } else if regions.panel.contains(position) {
            DetailTarget::Panel
        } else {
            DetailTarget::Backdrop
        };
        Some(target)
    }

    /// Handle a click at (`column`, `row`) of a modal drawn over `area`.
    pub fn handle_click(
        &mut self,
        area: Rect,
        column: u16,
        row: u16,
        confirm: &mut dyn Confirm,
        callbacks: &mut dyn MemoCallbacks,
    ) -> Result<bool, MemoError> {
        match self.target_at(area, column, row) {
            Some(target) => {
                self.activate(target, confirm, callbacks)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn activate(
        &mut self,
        target: DetailTarget,
        confirm: &mut dyn Confirm,
        callbacks: &mut dyn MemoCallbacks,
    ) -> Result<(), MemoError> {
        let Some(memo) = self.memo.as_ref() else {
            return Ok(());
        };

        match target {
            DetailTarget::Panel => {}
            DetailTarget::Backdrop | DetailTarget::Close => callbacks.on_close(),
            DetailTarget::Edit => {
                callbacks.on_edit(memo);
                callbacks.on_close();
            }
            DetailTarget::Delete => {
                if confirm.confirm(DELETE_PROMPT) {
                    callbacks.on_delete(&memo.id)?;
                    callbacks.on_close();
                }
            }
        }
        Ok(())
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, markdown: &dyn MarkdownRenderer) {
        let Some(memo) = self.memo.as_ref().filter(|_| self.is_open) else {
            return;
        };

        let regions = regions(area);
        buf.set_style(area, Style::default().add_modifier(Modifier::DIM));
        Clear.render(regions.panel, buf);
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(Span::styled(
                format!(" {} ", memo.title),
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .render(regions.panel, buf);
        Paragraph::new(Span::styled(CLOSE_LABEL, Style::default().fg(Color::Gray)))
            .render(regions.close, buf);

        let lines = detail_lines(memo, markdown);
        let max_offset = wrapped_height(&lines, regions.body.width)
            .saturating_sub(regions.body.height);
        self.max_offset.set(max_offset);
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((self.offset.min(max_offset), 0))
            .render(regions.body, buf);

        Paragraph::new(Span::styled(EDIT_LABEL, Style::default().fg(Color::Blue)))
            .render(regions.edit, buf);
        Paragraph::new(Span::styled(DELETE_LABEL, Style::default().fg(Color::Red)))
            .render(regions.delete, buf);
    }
}

fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines.iter().map(|line| line.width().div_ceil(width).max(1)).sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn detail_lines(memo: &Memo, markdown: &dyn MarkdownRenderer) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::Cyan);
    let value = Style::default().fg(Color::White);

    let mut header = vec![
        category_badge(&memo.category),
        Span::raw("  "),
        Span::styled("Created: ", label),
        Span::styled(
            memo.created_at
                .with_timezone(&chrono::Local)
                .format(TIMESTAMP_FORMAT)
                .to_string(),
            value,
        ),
    ];
    if memo.updated_at != memo.created_at {
        header.push(Span::styled("  |  ", Style::default().fg(Color::DarkGray)));
        header.push(Span::styled("Updated: ", label));
        header.push(Span::styled(
            memo.updated_at
                .with_timezone(&chrono::Local)
                .format(TIMESTAMP_FORMAT)
                .to_string(),
            value,
        ));
    }

    let mut lines = vec![Line::from(header), Line::default()];
    lines.extend(markdown.render(&memo.content).lines);

    if !memo.tags.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Tags",
            label.add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(tag_spans(&memo.tags)));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::markdown::TerminalMarkdown;
    use crate::tui::testing::{Recorder, buffer_text, memo};

    fn area() -> Rect {
        Rect::new(0, 0, 80, 24)
    }

    fn open(lock: &ScrollLock) -> MemoDetail {
        let mut detail = MemoDetail::new(lock.clone());
        detail.set_props(Some(memo("m1")), true);
        detail
    }

    fn render(detail: &MemoDetail) -> Buffer {
        let mut buf = Buffer::empty(area());
        detail.render(area(), &mut buf, &TerminalMarkdown);
        buf
    }

    #[test]
    fn hidden_unless_open_with_a_memo() {
        let lock = ScrollLock::new();
        let mut detail = MemoDetail::new(lock.clone());

        detail.set_props(Some(memo("m1")), false);
        assert!(!detail.is_visible());
        assert_eq!(render(&detail), Buffer::empty(area()));

        detail.set_props(None, true);
        assert!(!detail.is_visible());
        assert_eq!(render(&detail), Buffer::empty(area()));
    }

    #[test]
    fn escape_closes_once() {
        let lock = ScrollLock::new();
        let mut detail = open(&lock);
        let mut recorder = Recorder::default();
        let mut yes = |_: &str| true;

        assert!(detail.handle_key(KeyCode::Esc, &mut yes, &mut recorder).unwrap());
        assert_eq!(recorder.calls, vec!["close"]);
    }

    #[test]
    fn keys_are_ignored_when_closed() {
        let lock = ScrollLock::new();
        let mut detail = MemoDetail::new(lock);
        let mut recorder = Recorder::default();
        let mut yes = |_: &str| true;

        assert!(!detail.handle_key(KeyCode::Esc, &mut yes, &mut recorder).unwrap());
        assert!(recorder.calls.is_empty());
    }

    #[test]
    fn backdrop_closes_and_panel_does_not() {
        let lock = ScrollLock::new();
        let mut detail = open(&lock);
        let mut recorder = Recorder::default();
        let mut yes = |_: &str| true;

        let panel = regions(area()).panel;
        detail
            .handle_click(area(), panel.x + 2, panel.y + 3, &mut yes, &mut recorder)
            .unwrap();
        assert!(recorder.calls.is_empty());

        detail.handle_click(area(), 0, 0, &mut yes, &mut recorder).unwrap();
        assert_eq!(recorder.calls, vec!["close"]);
    }

    #[test]
    fn close_button_closes() {
        let lock = ScrollLock::new();
        let mut detail = open(&lock);
        let mut recorder = Recorder::default();
        let mut no = |_: &str| false;

        let close = regions(area()).close;
        assert_eq!(
            detail.target_at(area(), close.x, close.y),
            Some(DetailTarget::Close)
        );
        detail
            .handle_click(area(), close.x + 1, close.y, &mut no, &mut recorder)
            .unwrap();
        assert_eq!(recorder.calls, vec!["close"]);
    }

    #[test]
    fn edit_then_close() {
        let lock = ScrollLock::new();
        let mut detail = open(&lock);
        let mut recorder = Recorder::default();
        let mut yes = |_: &str| true;

        let edit = regions(area()).edit;
        detail
            .handle_click(area(), edit.x, edit.y, &mut yes, &mut recorder)
            .unwrap();
        assert_eq!(recorder.calls, vec!["edit:m1", "close"]);
    }

    #[test]
    fn delete_needs_confirmation() {
        let lock = ScrollLock::new();
        let mut detail = open(&lock);
        let mut recorder = Recorder::default();

        let mut no = |_: &str| false;
        detail.handle_key(KeyCode::Char('d'), &mut no, &mut recorder).unwrap();
        assert!(recorder.calls.is_empty());

        let mut yes = |_: &str| true;
        detail.handle_key(KeyCode::Char('d'), &mut yes, &mut recorder).unwrap();
        assert_eq!(recorder.calls, vec!["delete:m1", "close"]);
    }

    #[test]
    fn failed_delete_keeps_the_modal_open() {
        let lock = ScrollLock::new();
        let mut detail = open(&lock);
        let mut recorder = Recorder {
            fail_delete: true,
            ..Recorder::default()
        };
        let mut yes = |_: &str| true;

        let result = detail.handle_key(KeyCode::Char('d'), &mut yes, &mut recorder);
        assert_eq!(result, Err(MemoError::DeleteFailed));
        assert_eq!(recorder.count("close"), 0);
    }

    #[test]
    fn scroll_lock_follows_open_state() {
        let lock = ScrollLock::new();
        let mut detail = open(&lock);
        assert!(lock.is_locked());

        detail.set_props(Some(memo("m1")), false);
        assert!(!lock.is_locked());

        detail.set_props(Some(memo("m1")), true);
        assert!(lock.is_locked());
        drop(detail);
        assert!(!lock.is_locked());
    }

    #[test]
    fn updated_timestamp_only_when_changed() {
        let lock = ScrollLock::new();
        let mut detail = open(&lock);
        let screen = buffer_text(&render(&detail));
        assert!(screen.contains("Groceries"));
        assert!(screen.contains("Created: "));
        assert!(!screen.contains("Updated: "));
        assert!(screen.contains("• milk"));
        assert!(screen.contains("#home"));
        assert!(screen.contains("[ Edit ]"));

        let mut edited = memo("m1");
        edited.updated_at += chrono::Duration::hours(2);
        detail.set_props(Some(edited), true);
        let screen = buffer_text(&render(&detail));
        assert!(screen.contains("Updated: "));
    }

    #[test]
    fn content_scrolls_and_resets_for_another_memo() {
        let lock = ScrollLock::new();
        let mut detail = open(&lock);
        detail.scroll_by(3);
        detail.scroll_by(-5);
        assert_eq!(detail.offset, 0);

        detail.scroll_by(2);
        detail.set_props(Some(memo("m2")), true);
        assert_eq!(detail.offset, 0);
    }

    #[test]
    fn short_content_does_not_scroll_away() {
        let lock = ScrollLock::new();
        let mut detail = open(&lock);
        render(&detail);

        detail.scroll_by(50);
        assert_eq!(detail.offset, 0);
        let screen = buffer_text(&render(&detail));
        assert!(screen.contains("Created: "));
        assert!(screen.contains("milk"));
    }

    #[test]
    fn long_content_stops_at_its_last_line() {
        let lock = ScrollLock::new();
        let mut detail = MemoDetail::new(lock.clone());
        let mut long = memo("m1");
        long.content = (1..=40).map(|n| format!("line {}", n)).collect::<Vec<_>>().join("\n");
        detail.set_props(Some(long), true);
        render(&detail);

        detail.scroll_by(100);
        // Header, blank, 40 content lines, blank, Tags, tag line; 18 body rows.
        assert_eq!(detail.offset, 45 - 18);
        let screen = buffer_text(&render(&detail));
        assert!(screen.contains("line 40"));
        assert!(screen.contains("#home"));
        assert!(!screen.contains("Created: "));
    }
}
