use std::cell::RefCell;
use std::collections::HashSet;

/// Route of the memo listing screen.
pub const LISTING_PATH: &str = "/";

/// Marks cached views stale so the next render fetches again.
pub trait Revalidator {
    fn revalidate(&self, path: &str);
}

/// In-process record of stale routes, consumed by the views that cache them.
#[derive(Debug, Default)]
pub struct ViewCache {
    stale: RefCell<HashSet<String>>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `path` was stale and clears the mark.
    pub fn take_stale(&self, path: &str) -> bool {
        self.stale.borrow_mut().remove(path)
    }

    pub fn is_stale(&self, path: &str) -> bool {
        self.stale.borrow().contains(path)
    }
}

impl Revalidator for ViewCache {
    fn revalidate(&self, path: &str) {
        tracing::debug!(path, "revalidate");
        self.stale.borrow_mut().insert(path.to_string());
    }
}
