use crate::config::AppConfig;
use crate::service::{LISTING_PATH, MemoError, MemoService, Revalidator, ViewCache};
use crate::storage::{Memo, SqliteStore};
use crate::tui::confirm::Confirm;
use crate::tui::form::{FormOutcome, MemoForm};
use crate::tui::markdown::{MarkdownRenderer, PlainMarkdown, TerminalMarkdown};
use crate::tui::memo_detail::MemoDetail;
use crate::tui::memo_item::{ITEM_HEIGHT, ItemTarget, MemoItem, target_at};
use crate::tui::scroll::ScrollLock;
use crate::tui::theme::status_style;
use crate::tui::MemoCallbacks;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::cell::{Cell, OnceCell};
use std::rc::Rc;

const LIST_HELP: &str =
    "j/k: navigate | Enter: view | n: new | e: edit | d: delete | r: refresh | q/Esc: quit";
const DETAIL_HELP: &str = "e: edit | d: delete | j/k: scroll | Esc: close";
const FORM_HELP: &str = "Tab: next field | ←/→: category | Ctrl+S: save | Esc: cancel";

/// State the memo views call back into.
pub struct Session {
    pub service: MemoService<SqliteStore>,
    pub cache: Rc<ViewCache>,
    pub memos: Vec<Memo>,
    pub selected_index: usize,
    pub viewing: Option<Memo>,
    pub detail_open: bool,
    pub form: Option<MemoForm>,
    pub status_message: Option<String>,
}

impl MemoCallbacks for Session {
    fn on_view(&mut self, memo: &Memo) {
        self.viewing = Some(memo.clone());
        self.detail_open = true;
        self.status_message = None;
    }

    fn on_edit(&mut self, memo: &Memo) {
        self.form = Some(MemoForm::edit(memo));
        self.status_message = None;
    }

    fn on_delete(&mut self, id: &str) -> Result<(), MemoError> {
        self.service.delete(id)?;
        if self.viewing.as_ref().is_some_and(|m| m.id == id) {
            self.viewing = None;
        }
        self.status_message = Some("✓ Memo deleted".to_string());
        Ok(())
    }

    fn on_close(&mut self) {
        self.detail_open = false;
    }
}

pub struct App {
    pub session: Session,
    pub should_quit: bool,
    detail: MemoDetail,
    scroll_lock: ScrollLock,
    /// Memo to select once the listing is fetched again.
    focus_id: Option<String>,
    list_offset: Cell<usize>,
    list_area: Cell<Rect>,
    frame_area: Cell<Rect>,
    plain: bool,
    markdown: OnceCell<Box<dyn MarkdownRenderer>>,
}

impl App {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let db_path = config.db_path();
        let store = SqliteStore::open(&db_path)
            .map_err(|e| anyhow::anyhow!("Failed to open memo store {}: {}", db_path.display(), e))?;
        tracing::info!(path = %db_path.display(), "memo store opened");
        Ok(Self::with_store(store, config.plain))
    }

    pub fn with_store(store: SqliteStore, plain: bool) -> Self {
        let cache = Rc::new(ViewCache::new());
        let service = MemoService::new(store, cache.clone());
        let memos = service.list();
        let scroll_lock = ScrollLock::new();

        App {
            session: Session {
                service,
                cache,
                memos,
                selected_index: 0,
                viewing: None,
                detail_open: false,
                form: None,
                status_message: None,
            },
            should_quit: false,
            detail: MemoDetail::new(scroll_lock.clone()),
            scroll_lock,
            focus_id: None,
            list_offset: Cell::new(0),
            list_area: Cell::new(Rect::default()),
            frame_area: Cell::new(Rect::default()),
            plain,
            markdown: OnceCell::new(),
        }
    }

    pub fn detail(&self) -> &MemoDetail {
        &self.detail
    }

    fn markdown(&self) -> &dyn MarkdownRenderer {
        self.markdown
            .get_or_init(|| {
                if self.plain {
                    Box::new(PlainMarkdown)
                } else {
                    Box::new(TerminalMarkdown)
                }
            })
            .as_ref()
    }

    pub fn handle_key(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
        confirm: &mut dyn Confirm,
    ) -> Result<()> {
        let result = if self.session.form.is_some() {
            self.handle_form_key(key, modifiers);
            Ok(())
        } else if self.detail.is_visible() {
            self.detail
                .handle_key(key, confirm, &mut self.session)
                .map(|_| ())
        } else {
            self.handle_list_key(key, confirm)
        };

        self.finish_event(result);
        Ok(())
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, confirm: &mut dyn Confirm) -> Result<()> {
        if self.session.form.is_some() {
            return Ok(());
        }

        let result = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.detail.is_visible() {
                    self.detail
                        .handle_click(
                            self.frame_area.get(),
                            mouse.column,
                            mouse.row,
                            confirm,
                            &mut self.session,
                        )
                        .map(|_| ())
                } else {
                    self.click_list(mouse.column, mouse.row, confirm)
                }
            }
            MouseEventKind::ScrollDown => {
                self.scroll(1);
                Ok(())
            }
            MouseEventKind::ScrollUp => {
                self.scroll(-1);
                Ok(())
            }
            _ => Ok(()),
        };

        self.finish_event(result);
        Ok(())
    }

    fn handle_list_key(&mut self, key: KeyCode, confirm: &mut dyn Confirm) -> Result<(), MemoError> {
        match key {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('n') => {
                self.session.form = Some(MemoForm::create());
                self.session.status_message = None;
            }
            KeyCode::Char('r') => {
                self.session.cache.revalidate(LISTING_PATH);
                self.session.status_message = Some("✓ Memos refreshed".to_string());
            }
            KeyCode::Enter => self.activate_selected(ItemTarget::Card, confirm)?,
            KeyCode::Char('e') => self.activate_selected(ItemTarget::Edit, confirm)?,
            KeyCode::Char('d') => self.activate_selected(ItemTarget::Delete, confirm)?,
            _ => {}
        }
        Ok(())
    }

    fn handle_form_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        let Some(form) = self.session.form.as_mut() else {
            return;
        };

        match form.handle_key(key, modifiers) {
            FormOutcome::Pending => {
                self.session.status_message = form.error.as_ref().map(|e| format!("✗ {}", e));
            }
            FormOutcome::Cancel => {
                self.session.form = None;
                self.session.status_message = None;
            }
            FormOutcome::Submit(data) => {
                let saved = match form.editing_id() {
                    Some(id) => self.session.service.update(id, &data),
                    None => self.session.service.create(&data),
                };
                match saved {
                    Ok(memo) => {
                        self.session.status_message = Some(format!("✓ Saved: {}", memo.title));
                        self.session.form = None;
                        self.focus_id = Some(memo.id);
                    }
                    Err(e) => {
                        self.session.status_message = Some(format!("✗ {}", e));
                    }
                }
            }
        }
    }

    fn activate_selected(&mut self, target: ItemTarget, confirm: &mut dyn Confirm) -> Result<(), MemoError> {
        let Some(memo) = self.session.memos.get(self.session.selected_index).cloned() else {
            return Ok(());
        };
        MemoItem::new(&memo).activate(target, confirm, &mut self.session)
    }

    fn click_list(&mut self, column: u16, row: u16, confirm: &mut dyn Confirm) -> Result<(), MemoError> {
        let hit = self
            .card_areas(self.list_area.get())
            .into_iter()
            .find_map(|(index, area)| target_at(area, column, row).map(|target| (index, target)));

        match hit {
            Some((index, target)) => {
                self.session.selected_index = index;
                self.activate_selected(target, confirm)
            }
            None => Ok(()),
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.session.memos.len();
        if len == 0 {
            return;
        }
        let next = self.session.selected_index.saturating_add_signed(delta);
        self.session.selected_index = next.min(len - 1);
    }

    fn scroll(&mut self, delta: i16) {
        if self.scroll_lock.is_locked() {
            self.detail.scroll_by(delta);
        } else {
            self.move_selection(delta as isize);
        }
    }

    fn select_id(&mut self, id: &str) {
        if let Some(index) = self.session.memos.iter().position(|m| m.id == id) {
            self.session.selected_index = index;
        }
    }

    /// Report failures, push props into the detail view and re-fetch the
    /// listing when a mutation marked it stale.
    fn finish_event(&mut self, result: Result<(), MemoError>) {
        if let Err(e) = result {
            self.session.status_message = Some(format!("✗ {}", e));
        }

        if self.session.cache.take_stale(LISTING_PATH) {
            let keep = self.focus_id.take().or_else(|| {
                self.session
                    .memos
                    .get(self.session.selected_index)
                    .map(|m| m.id.clone())
            });
            self.session.memos = self.session.service.list();
            if let Some(id) = keep {
                self.select_id(&id);
            }
            if let Some(viewing) = self.session.viewing.as_ref() {
                let fresh = self.session.memos.iter().find(|m| m.id == viewing.id).cloned();
                self.session.viewing = fresh;
            }
        }
        if self.session.selected_index >= self.session.memos.len() {
            self.session.selected_index = self.session.memos.len().saturating_sub(1);
        }

        self.detail
            .set_props(self.session.viewing.clone(), self.session.detail_open);
    }

    fn card_areas(&self, list_area: Rect) -> Vec<(usize, Rect)> {
        let inner = Block::default().borders(Borders::ALL).inner(list_area);
        let visible = (inner.height / ITEM_HEIGHT) as usize;
        let offset = self.list_offset.get();

        (offset..self.session.memos.len().min(offset + visible))
            .enumerate()
            .map(|(slot, index)| {
                let area = Rect {
                    x: inner.x,
                    y: inner.y + slot as u16 * ITEM_HEIGHT,
                    width: inner.width,
                    height: ITEM_HEIGHT,
                };
                (index, area)
            })
            .collect()
    }

    /// Keep the selected card on screen unless the list is scroll locked.
    fn follow_selection(&self, list_area: Rect) {
        if self.scroll_lock.is_locked() {
            return;
        }
        let inner = Block::default().borders(Borders::ALL).inner(list_area);
        let visible = ((inner.height / ITEM_HEIGHT) as usize).max(1);
        let selected = self.session.selected_index;
        let offset = self.list_offset.get();

        if selected < offset {
            self.list_offset.set(selected);
        } else if selected >= offset + visible {
            self.list_offset.set(selected + 1 - visible);
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        self.frame_area.set(frame.area());

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        // Title bar
        let title = Paragraph::new("memopad - notes at hand")
            .block(Block::default().borders(Borders::ALL).title("memopad"))
            .style(Style::default().fg(Color::Cyan));
        frame.render_widget(title, chunks[0]);

        match self.session.form.as_ref() {
            Some(form) => form.render(frame, chunks[1]),
            None => self.render_list(frame, chunks[1]),
        }

        self.render_status(frame, chunks[2]);

        self.detail
            .render(frame.area(), frame.buffer_mut(), self.markdown());
    }

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        self.list_area.set(area);
        self.follow_selection(area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Memos ({})", self.session.memos.len()));

        if self.session.memos.is_empty() {
            let empty = Paragraph::new("No memos yet. Press n to write one.")
                .block(block)
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(empty, area);
            return;
        }

        frame.render_widget(block, area);
        for (index, card) in self.card_areas(area) {
            let memo = &self.session.memos[index];
            MemoItem::new(memo)
                .selected(index == self.session.selected_index)
                .render(card, frame.buffer_mut(), self.markdown());
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let (text, style) = match self.session.status_message.as_deref() {
            Some(message) => (message, status_style(message)),
            None => {
                let help = if self.session.form.is_some() {
                    FORM_HELP
                } else if self.detail.is_visible() {
                    DETAIL_HELP
                } else {
                    LIST_HELP
                };
                (help, Style::default().fg(Color::DarkGray))
            }
        };

        let status = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .style(style);
        frame.render_widget(status, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Category, MemoFields, MemoFormData, MemoTable, StoreClient};
    use crate::tui::testing::buffer_text;
    use ratatui::backend::TestBackend;

    fn app() -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("memos.db")).unwrap();
        (dir, App::with_store(store, false))
    }

    fn seed(app: &mut App, title: &str) -> Memo {
        let memo = app
            .session
            .service
            .create(&MemoFormData {
                title: title.to_string(),
                content: format!("about {}", title),
                category: Category::Personal,
                tags: None,
            })
            .unwrap();
        // Same as saving through the form: the new memo becomes the selection.
        app.focus_id = Some(memo.id.clone());
        app.finish_event(Ok(()));
        memo
    }

    fn press(app: &mut App, key: KeyCode, confirm: &mut dyn Confirm) {
        app.handle_key(key, KeyModifiers::NONE, confirm).unwrap();
    }

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 30)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn create_through_the_form() {
        let (_dir, mut app) = app();
        let mut yes = |_: &str| true;

        press(&mut app, KeyCode::Char('n'), &mut yes);
        for c in "Groceries".chars() {
            press(&mut app, KeyCode::Char(c), &mut yes);
        }
        app.handle_key(KeyCode::Char('s'), KeyModifiers::CONTROL, &mut yes)
            .unwrap();

        assert!(app.session.form.is_none());
        assert_eq!(app.session.memos.len(), 1);
        assert_eq!(app.session.memos[0].title, "Groceries");
        assert_eq!(app.session.status_message.as_deref(), Some("✓ Saved: Groceries"));
        assert!(draw(&app).contains("Groceries"));
    }

    #[test]
    fn view_then_escape() {
        let (_dir, mut app) = app();
        seed(&mut app, "first");
        let mut yes = |_: &str| true;

        press(&mut app, KeyCode::Enter, &mut yes);
        assert!(app.detail().is_visible());
        assert!(app.scroll_lock.is_locked());
        assert!(draw(&app).contains("Created: "));

        press(&mut app, KeyCode::Esc, &mut yes);
        assert!(!app.detail().is_visible());
        assert!(!app.scroll_lock.is_locked());
        assert!(!app.should_quit);
    }

    #[test]
    fn delete_from_the_list_honours_the_prompt() {
        let (_dir, mut app) = app();
        seed(&mut app, "keep");

        let mut no = |_: &str| false;
        press(&mut app, KeyCode::Char('d'), &mut no);
        assert_eq!(app.session.memos.len(), 1);

        let mut yes = |_: &str| true;
        press(&mut app, KeyCode::Char('d'), &mut yes);
        assert!(app.session.memos.is_empty());
        assert_eq!(app.session.status_message.as_deref(), Some("✓ Memo deleted"));
    }

    #[test]
    fn delete_from_the_detail_view_closes_it() {
        let (_dir, mut app) = app();
        seed(&mut app, "older");
        seed(&mut app, "newer");
        let mut yes = |_: &str| true;

        assert_eq!(app.session.selected_index, 0);
        press(&mut app, KeyCode::Enter, &mut yes);
        assert!(app.detail().is_visible());
        press(&mut app, KeyCode::Char('d'), &mut yes);

        assert!(!app.detail().is_visible());
        let titles: Vec<&str> = app.session.memos.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["older"]);
    }

    #[test]
    fn edit_from_the_detail_view_opens_the_form() {
        let (_dir, mut app) = app();
        let memo = seed(&mut app, "draft");
        let mut yes = |_: &str| true;

        press(&mut app, KeyCode::Enter, &mut yes);
        press(&mut app, KeyCode::Char('e'), &mut yes);
        assert!(!app.detail().is_visible());
        let form = app.session.form.as_ref().unwrap();
        assert_eq!(form.editing_id(), Some(memo.id.as_str()));

        press(&mut app, KeyCode::Char('!'), &mut yes);
        app.handle_key(KeyCode::Char('s'), KeyModifiers::CONTROL, &mut yes)
            .unwrap();
        assert_eq!(app.session.memos[0].content, "about draft!");
        assert_eq!(app.session.memos[0].id, memo.id);
    }

    #[test]
    fn mouse_clicks_reach_cards_and_backdrop() {
        let (_dir, mut app) = app();
        seed(&mut app, "clicked");
        let mut yes = |_: &str| true;
        draw(&app);

        // Title bar is 3 rows, list border 1 row, card border 1 row.
        app.handle_mouse(click(4, 6), &mut yes).unwrap();
        assert!(app.detail().is_visible());

        draw(&app);
        app.handle_mouse(click(0, 0), &mut yes).unwrap();
        assert!(!app.detail().is_visible());
    }

    #[test]
    fn wheel_is_captured_while_the_modal_is_open() {
        let (_dir, mut app) = app();
        seed(&mut app, "a");
        seed(&mut app, "b");
        let mut yes = |_: &str| true;
        let wheel = MouseEvent {
            kind: MouseEventKind::ScrollDown,
            column: 1,
            row: 1,
            modifiers: KeyModifiers::NONE,
        };

        assert_eq!(app.session.selected_index, 0);
        press(&mut app, KeyCode::Enter, &mut yes);
        app.handle_mouse(wheel, &mut yes).unwrap();
        assert_eq!(app.session.selected_index, 0);

        press(&mut app, KeyCode::Esc, &mut yes);
        app.handle_mouse(wheel, &mut yes).unwrap();
        assert_eq!(app.session.selected_index, 1);
    }

    #[test]
    fn refresh_picks_up_outside_writes_and_keeps_the_selection() {
        let (dir, mut app) = app();
        seed(&mut app, "older");
        let mut yes = |_: &str| true;

        let outside = SqliteStore::open(dir.path().join("memos.db")).unwrap();
        outside
            .connect()
            .unwrap()
            .insert(MemoFields {
                title: "outside",
                content: "",
                category: "work",
                tags: &[],
            })
            .unwrap();

        press(&mut app, KeyCode::Char('x'), &mut yes);
        assert_eq!(app.session.memos.len(), 1);

        press(&mut app, KeyCode::Char('r'), &mut yes);
        let titles: Vec<&str> = app.session.memos.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["outside", "older"]);
        assert_eq!(app.session.selected_index, 1);
        assert_eq!(app.session.status_message.as_deref(), Some("✓ Memos refreshed"));
    }

    #[test]
    fn quit_from_the_list() {
        let (_dir, mut app) = app();
        let mut yes = |_: &str| true;
        press(&mut app, KeyCode::Char('q'), &mut yes);
        assert!(app.should_quit);
    }
}
