use chrono::{DateTime, Local, TimeZone, Utc};
use ratatui::buffer::Buffer;
use ratatui::layout::Position;
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::fmt::Display;

use super::confirm::Confirm;
use super::markdown::MarkdownRenderer;
use super::theme::{category_badge, tag_spans};
use super::{DELETE_PROMPT, MemoCallbacks};
use crate::service::MemoError;
use crate::storage::Memo;

/// Rows taken by one card, borders included.
pub const ITEM_HEIGHT: u16 = 8;

const PREVIEW_LINES: usize = 3;
const EDIT_LABEL: &str = "[e]";
const DELETE_LABEL: &str = "[x]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemTarget {
    Card,
    Edit,
    Delete,
}

struct ItemRegions {
    title: Rect,
    edit: Rect,
    delete: Rect,
    meta: Rect,
    preview: Rect,
    tags: Rect,
}

fn regions(area: Rect) -> ItemRegions {
    let inner = Block::default().borders(Borders::ALL).inner(area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(PREVIEW_LINES as u16),
            Constraint::Length(1),
        ])
        .split(inner);

    let header = rows[0];
    let button_width = EDIT_LABEL.len() as u16;
    let delete = Rect {
        x: header.right().saturating_sub(button_width),
        width: button_width.min(header.width),
        ..header
    };
    let edit = Rect {
        x: delete.x.saturating_sub(button_width + 1).max(header.x),
        width: button_width.min(header.width),
        ..header
    };
    let title = Rect {
        width: edit.x.saturating_sub(header.x + 1),
        ..header
    };

    ItemRegions {
        title,
        edit,
        delete,
        meta: rows[1],
        preview: rows[2],
        tags: rows[3],
    }
}

/// Which part of a card drawn in `area` sits under the pointer. Buttons win
/// over the card body, so a button click never also counts as a card click.
pub fn target_at(area: Rect, column: u16, row: u16) -> Option<ItemTarget> {
    let position = Position::new(column, row);
    if !area.contains(position) {
        return None;
    }

    let regions = regions(area);
    if regions.edit.contains(position) {
        Some(ItemTarget::Edit)
    } else if regions.delete.contains(position) {
        Some(ItemTarget::Delete)
    } else {
        Some(ItemTarget::Card)
    }
}

/// `"today HH:MM"` when `at` falls on the same calendar day as `now` (in
/// `now`'s zone), otherwise `"Month Day"`.
pub fn relative_date<Tz>(at: &DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let local = at.with_timezone(&now.timezone());
    if local.date_naive() == now.date_naive() {
        format!("today {}", local.format("%H:%M"))
    } else {
        local.format("%B %-d").to_string()
    }
}

/// Summary card for one memo in the listing.
pub struct MemoItem<'a> {
    memo: &'a Memo,
    selected: bool,
    now: DateTime<Local>,
}

impl<'a> MemoItem<'a> {
    pub fn new(memo: &'a Memo) -> Self {
        MemoItem {
            memo,
            selected: false,
            now: Local::now(),
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn now(mut self, now: DateTime<Local>) -> Self {
        self.now = now;
        self
    }

    /// Run the action behind `target`. Deleting asks `confirm` first and does
    /// nothing when the answer is no.
    pub fn activate(
        &self,
        target: ItemTarget,
        confirm: &mut dyn Confirm,
        callbacks: &mut dyn MemoCallbacks,
    ) -> Result<(), MemoError> {
        match target {
            ItemTarget::Card => callbacks.on_view(self.memo),
            ItemTarget::Edit => callbacks.on_edit(self.memo),
            ItemTarget::Delete => {
                if confirm.confirm(DELETE_PROMPT) {
                    callbacks.on_delete(&self.memo.id)?;
                }
            }
        }
        Ok(())
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, markdown: &dyn MarkdownRenderer) {
        let border_style = if self.selected {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .render(area, buf);

        let regions = regions(area);

        let mut title_style = Style::default().fg(Color::White);
        if self.selected {
            title_style = title_style.add_modifier(Modifier::BOLD);
        }
        Paragraph::new(Span::styled(self.memo.title.clone(), title_style))
            .render(regions.title, buf);
        Paragraph::new(Span::styled(EDIT_LABEL, Style::default().fg(Color::Blue)))
            .render(regions.edit, buf);
        Paragraph::new(Span::styled(DELETE_LABEL, Style::default().fg(Color::Red)))
            .render(regions.delete, buf);

        Paragraph::new(Line::from(vec![
            category_badge(&self.memo.category),
            Span::raw(" "),
            Span::styled(
                relative_date(&self.memo.updated_at, &self.now),
                Style::default().fg(Color::DarkGray),
            ),
        ]))
        .render(regions.meta, buf);

        let preview: Vec<Line> = markdown
            .render(&self.memo.content)
            .lines
            .into_iter()
            .take(PREVIEW_LINES)
            .collect();
        Paragraph::new(preview).render(regions.preview, buf);

        if !self.memo.tags.is_empty() {
            Paragraph::new(Line::from(tag_spans(&self.memo.tags))).render(regions.tags, buf);
        }
    }
}
