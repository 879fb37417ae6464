pub mod app;
pub mod confirm;
pub mod form;
pub mod markdown;
pub mod memo_detail;
pub mod memo_item;
pub mod scroll;
pub mod theme;

use ratatui::layout::Rect;

use crate::service::MemoError;
use crate::storage::Memo;

pub const DELETE_PROMPT: &str = "Really delete this memo?";

/// Handlers the memo views call back into. The listing screen implements
/// these against the repository actions.
pub trait MemoCallbacks {
    fn on_view(&mut self, memo: &Memo);
    fn on_edit(&mut self, memo: &Memo);
    fn on_delete(&mut self, id: &str) -> Result<(), MemoError>;
    fn on_close(&mut self);
}

/// Rectangle of at most `width` x `height` centered in `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_clamps_to_area() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(centered(area, 20, 4), Rect::new(10, 3, 20, 4));
        assert_eq!(centered(area, 100, 100), area);
    }
}
