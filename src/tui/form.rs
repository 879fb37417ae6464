use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::*;

use super::theme::category_badge;
use crate::storage::{Category, Memo, MemoFormData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Content,
    Category,
    Tags,
}

impl FormField {
    const ORDER: [FormField; 4] = [
        FormField::Title,
        FormField::Content,
        FormField::Category,
        FormField::Tags,
    ];

    fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    fn prev(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome {
    Pending,
    Cancel,
    Submit(MemoFormData),
}

/// Create/edit form for a memo.
#[derive(Debug, Clone)]
pub struct MemoForm {
    editing: Option<String>,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub tags: String,
    pub focus: FormField,
    pub error: Option<String>,
}

impl MemoForm {
    pub fn create() -> Self {
        MemoForm {
            editing: None,
            title: String::new(),
            content: String::new(),
            category: Category::default(),
            tags: String::new(),
            focus: FormField::Title,
            error: None,
        }
    }

    pub fn edit(memo: &Memo) -> Self {
        MemoForm {
            editing: Some(memo.id.clone()),
            title: memo.title.clone(),
            content: memo.content.clone(),
            category: memo.category.clone(),
            tags: memo.tags.join(", "),
            focus: FormField::Content,
            error: None,
        }
    }

    /// Id of the memo being edited, `None` when creating.
    pub fn editing_id(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn to_form_data(&self) -> Result<MemoFormData, &'static str> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Title is required");
        }
        Ok(MemoFormData {
            title: title.to_string(),
            content: self.content.clone(),
            category: self.category.clone(),
            tags: Some(parse_tags(&self.tags)),
        })
    }

    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> FormOutcome {
        match key {
            KeyCode::Esc => return FormOutcome::Cancel,
            KeyCode::Char('s') if modifiers.contains(KeyModifiers::CONTROL) => {
                return match self.to_form_data() {
                    Ok(data) => FormOutcome::Submit(data),
                    Err(message) => {
                        self.error = Some(message.to_string());
                        self.focus = FormField::Title;
                        FormOutcome::Pending
                    }
                };
            }
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Enter => {
                if self.focus == FormField::Content {
                    self.content.push('\n');
                } else {
                    self.focus = self.focus.next();
                }
            }
            KeyCode::Left if self.focus == FormField::Category => {
                self.category = self.category.prev();
            }
            KeyCode::Right | KeyCode::Char(' ') if self.focus == FormField::Category => {
                self.category = self.category.next();
            }
            KeyCode::Char(_) if modifiers.contains(KeyModifiers::CONTROL) => {}
            KeyCode::Char(c) => {
                if let Some(text) = self.focused_text() {
                    text.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(text) = self.focused_text() {
                    text.pop();
                }
            }
            _ => {}
        }
        FormOutcome::Pending
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Title => Some(&mut self.title),
            FormField::Content => Some(&mut self.content),
            FormField::Tags => Some(&mut self.tags),
            FormField::Category => None,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        let block = |name: &str, field: FormField| {
            let style = if self.focus == field {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Block::default()
                .borders(Borders::ALL)
                .border_style(style)
                .title(name.to_string())
        };

        let heading = if self.editing.is_some() { "Title (editing)" } else { "Title (new memo)" };
        frame.render_widget(
            Paragraph::new(self.title.as_str()).block(block(heading, FormField::Title)),
            chunks[0],
        );

        let content_title = format!(
            "Content ({} chars, {} lines)",
            self.content.chars().count(),
            self.content.lines().count()
        );
        frame.render_widget(
            Paragraph::new(self.content.as_str())
                .block(block(&content_title, FormField::Content))
                .wrap(Wrap { trim: false }),
            chunks[1],
        );

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                category_badge(&self.category),
                Span::styled("  ←/→ to change", Style::default().fg(Color::DarkGray)),
            ]))
            .block(block("Category", FormField::Category)),
            chunks[2],
        );

        frame.render_widget(
            Paragraph::new(self.tags.as_str()).block(block("Tags (comma separated)", FormField::Tags)),
            chunks[3],
        );
    }
}

/// Split comma separated tags, dropping blanks and a leading `#`.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|t| t.trim().trim_start_matches('#').trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::testing::memo;

    fn type_text(form: &mut MemoForm, text: &str) {
        for c in text.chars() {
            form.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn parses_tags() {
        assert_eq!(parse_tags(" home, #weekly ,, "), vec!["home", "weekly"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut form = MemoForm::create();
        form.focus = FormField::Content;
        type_text(&mut form, "body");

        let outcome = form.handle_key(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(outcome, FormOutcome::Pending);
        assert_eq!(form.error.as_deref(), Some("Title is required"));
        assert_eq!(form.focus, FormField::Title);
    }

    #[test]
    fn fills_every_field() {
        let mut form = MemoForm::create();
        type_text(&mut form, "Groceries");
        form.handle_key(KeyCode::Tab, KeyModifiers::NONE);
        type_text(&mut form, "- milk");
        form.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        type_text(&mut form, "- eggs");
        form.handle_key(KeyCode::Tab, KeyModifiers::NONE);
        form.handle_key(KeyCode::Right, KeyModifiers::NONE);
        form.handle_key(KeyCode::Tab, KeyModifiers::NONE);
        type_text(&mut form, "home, errands");

        let outcome = form.handle_key(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(
            outcome,
            FormOutcome::Submit(MemoFormData {
                title: "Groceries".to_string(),
                content: "- milk\n- eggs".to_string(),
                category: Category::Work,
                tags: Some(vec!["home".to_string(), "errands".to_string()]),
            })
        );
    }

    #[test]
    fn edit_prefills_from_memo() {
        let form = MemoForm::edit(&memo("m1"));
        assert_eq!(form.editing_id(), Some("m1"));
        assert_eq!(form.tags, "home");
        assert_eq!(form.to_form_data().unwrap().title, "Groceries");
    }

    #[test]
    fn control_chords_do_not_type() {
        let mut form = MemoForm::create();
        type_text(&mut form, "ab");
        assert_eq!(form.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL), FormOutcome::Pending);
        form.handle_key(KeyCode::Char('x'), KeyModifiers::CONTROL);
        assert_eq!(form.title, "ab");
        form.handle_key(KeyCode::Char('C'), KeyModifiers::SHIFT);
        assert_eq!(form.title, "abC");
    }

    #[test]
    fn escape_cancels() {
        let mut form = MemoForm::create();
        assert_eq!(form.handle_key(KeyCode::Esc, KeyModifiers::NONE), FormOutcome::Cancel);
    }
}
