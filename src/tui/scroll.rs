use std::cell::Cell;
use std::rc::Rc;

/// Shared flag that keeps the listing from scrolling while an overlay is up.
#[derive(Debug, Clone, Default)]
pub struct ScrollLock {
    holders: Rc<Cell<usize>>,
}

impl ScrollLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        self.holders.get() > 0
    }

    /// Lock scrolling until the returned guard is dropped.
    pub fn acquire(&self) -> ScrollGuard {
        self.holders.set(self.holders.get() + 1);
        ScrollGuard {
            holders: self.holders.clone(),
        }
    }
}

#[derive(Debug)]
pub struct ScrollGuard {
    holders: Rc<Cell<usize>>,
}

impl Drop for ScrollGuard {
    fn drop(&mut self) {
        self.holders.set(self.holders.get().saturating_sub(1));
    }
}
