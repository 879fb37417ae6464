use ratatui::prelude::*;

/// Turns memo markdown into styled terminal text.
pub trait MarkdownRenderer {
    fn render(&self, source: &str) -> Text<'static>;
}

/// Drop escape sequences and control characters so memo text cannot drive the terminal.
pub fn sanitize(source: &str) -> String {
    // Tabs would be dropped by the stripper along with other C0 controls.
    strip_ansi_escapes::strip_str(source.replace('\t', " "))
        .chars()
        .filter(|c| *c == '\n' || !c.is_control())
        .collect()
}

/// Source shown as-is, one line per line.
pub struct PlainMarkdown;

impl MarkdownRenderer for PlainMarkdown {
    fn render(&self, source: &str) -> Text<'static> {
        Text::from(
            sanitize(source)
                .lines()
                .map(|line| Line::from(line.to_string()))
                .collect::<Vec<_>>(),
        )
    }
}

/// Line oriented renderer covering headings, lists, quotes, rules, fenced
/// code and inline `**bold**`, `*italic*` and `` `code` ``.
pub struct TerminalMarkdown;

impl MarkdownRenderer for TerminalMarkdown {
    fn render(&self, source: &str) -> Text<'static> {
        let clean = sanitize(source);
        let mut lines = Vec::new();
        let mut in_code = false;

        for raw in clean.lines() {
            let trimmed = raw.trim_start();

            if trimmed.starts_with("```") {
                in_code = !in_code;
                continue;
            }
            if in_code {
                lines.push(Line::from(Span::styled(
                    format!("  {}", raw),
                    Style::default().fg(Color::Yellow),
                )));
                continue;
            }

            lines.push(render_block(trimmed));
        }

        Text::from(lines)
    }
}

fn render_block(line: &str) -> Line<'static> {
    if let Some((level, heading)) = heading(line) {
        let mut style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        if level == 1 {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        return Line::from(inline(heading, style));
    }

    if is_rule(line) {
        return Line::from(Span::styled(
            "─".repeat(24),
            Style::default().fg(Color::DarkGray),
        ));
    }

    if let Some(quote) = line.strip_prefix('>') {
        let style = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC);
        let mut spans = vec![Span::styled("│ ", style)];
        spans.extend(inline(quote.trim_start(), style));
        return Line::from(spans);
    }

    if let Some(item) = ["- ", "* ", "+ "]
        .iter()
        .find_map(|marker| line.strip_prefix(marker))
    {
        let (bullet, text) = if let Some(rest) = item.strip_prefix("[ ] ") {
            ("☐ ", rest)
        } else if let Some(rest) = item
            .strip_prefix("[x] ")
            .or_else(|| item.strip_prefix("[X] "))
        {
            ("☑ ", rest)
        } else {
            ("• ", item)
        };
        let mut spans = vec![Span::styled(bullet, Style::default().fg(Color::Cyan))];
        spans.extend(inline(text, Style::default()));
        return Line::from(spans);
    }

    Line::from(inline(line, Style::default()))
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&level) {
        line[level..].strip_prefix(' ').map(|rest| (level, rest.trim()))
    } else {
        None
    }
}

fn is_rule(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3 && ['-', '*', '_'].iter().any(|m| compact.chars().all(|c| c == *m))
}

fn marker_style(marker: &str) -> Style {
    match marker {
        "**" => Style::default().add_modifier(Modifier::BOLD),
        "`" => Style::default().fg(Color::Yellow),
        _ => Style::default().add_modifier(Modifier::ITALIC),
    }
}

fn inline(text: &str, base: Style) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];

        let emphasized = ["**", "`", "*"].iter().find_map(|marker| {
            let body = rest.strip_prefix(marker)?;
            let end = body.find(marker)?;
            (end > 0).then(|| (*marker, &body[..end]))
        });

        if let Some((marker, body)) = emphasized {
            if !plain.is_empty() {
                spans.push(Span::styled(std::mem::take(&mut plain), base));
            }
            spans.push(Span::styled(body.to_string(), base.patch(marker_style(marker))));
            i += body.len() + marker.len() * 2;
            continue;
        }

        match rest.chars().next() {
            Some(c) => {
                plain.push(c);
                i += c.len_utf8();
            }
            None => break,
        }
    }

    if !plain.is_empty() {
        spans.push(Span::styled(plain, base));
    }
    spans
}
