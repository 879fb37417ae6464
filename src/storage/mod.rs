pub mod memo;
pub mod sqlite;

pub use memo::{Category, Memo, MemoFields, MemoFormData, MemoRow};
pub use sqlite::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("malformed row: {0}")]
    Malformed(String),
    #[error("unknown id")]
    UnknownId,
}

/// Hands out one session per repository action.
pub trait StoreClient {
    type Session: MemoTable;

    /// Acquire a session. It is released when dropped.
    fn connect(&self) -> Result<Self::Session, StoreError>;
}

/// Operations on the `memos` relation available to a session.
pub trait MemoTable {
    /// All rows, newest `created_at` first.
    fn select_all(&self) -> Result<Vec<MemoRow>, StoreError>;

    fn select_by_id(&self, id: &str) -> Result<Option<MemoRow>, StoreError>;

    /// Insert a row; the store assigns `id`, `created_at` and `updated_at`.
    fn insert(&self, fields: MemoFields<'_>) -> Result<MemoRow, StoreError>;

    /// Replace the editable columns of one row and refresh `updated_at`.
    /// Fails with [`StoreError::UnknownId`] when no row matches.
    fn update(&self, id: &str, fields: MemoFields<'_>) -> Result<MemoRow, StoreError>;

    /// Remove a row. Removing an absent id is not an error.
    fn delete(&self, id: &str) -> Result<(), StoreError>;
}
