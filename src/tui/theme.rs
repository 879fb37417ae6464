use ratatui::prelude::*;

use crate::storage::Category;

/// Badge colors per category. Anything not listed uses [`FALLBACK_COLOR`].
const CATEGORY_COLORS: [(&str, Color); 5] = [
    ("personal", Color::LightBlue),
    ("work", Color::LightGreen),
    ("study", Color::LightMagenta),
    ("idea", Color::LightYellow),
    ("other", FALLBACK_COLOR),
];

const FALLBACK_COLOR: Color = Color::Gray;

pub fn category_color(category: &Category) -> Color {
    CATEGORY_COLORS
        .iter()
        .find(|(name, _)| *name == category.as_str())
        .map(|(_, color)| *color)
        .unwrap_or(FALLBACK_COLOR)
}

pub fn category_badge(category: &Category) -> Span<'static> {
    Span::styled(
        format!(" {} ", category.label()),
        Style::default()
            .fg(Color::Black)
            .bg(category_color(category))
            .add_modifier(Modifier::BOLD),
    )
}

pub fn tag_spans(tags: &[String]) -> Vec<Span<'static>> {
    let mut spans = Vec::with_capacity(tags.len() * 2);
    for (i, tag) in tags.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            format!("#{}", tag),
            Style::default().fg(Color::Blue),
        ));
    }
    spans
}

/// Style for a status line message, keyed on its leading symbol.
pub fn status_style(message: &str) -> Style {
    if message.starts_with('✓') {
        Style::default().fg(Color::Green)
    } else if message.starts_with('✗') {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Yellow)
    }
}
