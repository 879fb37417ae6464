pub mod memo_service;
pub mod revalidate;

pub use memo_service::{MemoError, MemoService};
pub use revalidate::{LISTING_PATH, Revalidator, ViewCache};
