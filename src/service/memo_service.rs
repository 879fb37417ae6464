use std::rc::Rc;

use crate::service::revalidate::{LISTING_PATH, Revalidator};
use crate::storage::{Memo, MemoFields, MemoFormData, MemoTable, StoreClient, StoreError};

/// Failure surfaced to callers of the write actions. The store-level cause is
/// logged where it happens and not carried here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MemoError {
    #[error("Failed to create memo")]
    CreateFailed,
    #[error("Failed to update memo")]
    UpdateFailed,
    #[error("Failed to delete memo")]
    DeleteFailed,
}

/// Repository actions over memos. Each call acquires its own store session.
pub struct MemoService<C: StoreClient> {
    store: C,
    revalidator: Rc<dyn Revalidator>,
}

impl<C: StoreClient> MemoService<C> {
    pub fn new(store: C, revalidator: Rc<dyn Revalidator>) -> Self {
        MemoService { store, revalidator }
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    /// All memos, newest first. Store failures are logged and yield an empty
    /// list; a row that cannot be read is logged and left out.
    pub fn list(&self) -> Vec<Memo> {
        let rows = match self.store.connect().and_then(|session| session.select_all()) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(error = %e, "Error fetching memos");
                return Vec::new();
            }
        };

        rows.into_iter()
            .filter_map(|row| {
                let id = row.id.clone();
                Memo::try_from(row)
                    .map_err(|e| tracing::warn!(id = %id, error = %e, "Skipping unreadable memo"))
                    .ok()
            })
            .collect()
    }

    /// A single memo, or `None` when it does not exist or cannot be read.
    pub fn get(&self, id: &str) -> Option<Memo> {
        let result = self.store.connect().and_then(|session| {
            session
                .select_by_id(id)?
                .map(Memo::try_from)
                .transpose()
        });

        match result {
            Ok(Some(memo)) => Some(memo),
            Ok(None) => {
                tracing::warn!(id, "Error fetching memo: not found");
                None
            }
            Err(e) => {
                tracing::error!(id, error = %e, "Error fetching memo");
                None
            }
        }
    }

    pub fn create(&self, form: &MemoFormData) -> Result<Memo, MemoError> {
        let memo = self
            .write(|session| session.insert(MemoFields::from(form)))
            .map_err(|e| {
                tracing::error!(title = %form.title, error = %e, "Error creating memo");
                MemoError::CreateFailed
            })?;

        tracing::info!(id = %memo.id, "memo created");
        self.revalidator.revalidate(LISTING_PATH);
        Ok(memo)
    }

    /// Replace title, content, category and tags of an existing memo.
    pub fn update(&self, id: &str, form: &MemoFormData) -> Result<Memo, MemoError> {
        let memo = self
            .write(|session| session.update(id, MemoFields::from(form)))
            .map_err(|e| {
                tracing::error!(id, error = %e, "Error updating memo");
                MemoError::UpdateFailed
            })?;

        tracing::info!(id, "memo updated");
        self.revalidator.revalidate(LISTING_PATH);
        Ok(memo)
    }

    pub fn delete(&self, id: &str) -> Result<(), MemoError> {
        self.store
            .connect()
            .and_then(|session| session.delete(id))
            .map_err(|e| {
                tracing::error!(id, error = %e, "Error deleting memo");
                MemoError::DeleteFailed
            })?;

        tracing::info!(id, "memo deleted");
        self.revalidator.revalidate(LISTING_PATH);
        Ok(())
    }

    fn write<F>(&self, op: F) -> Result<Memo, StoreError>
    where
        F: FnOnce(&C::Session) -> Result<crate::storage::MemoRow, StoreError>,
    {
        let session = self.store.connect()?;
        Memo::try_from(op(&session)?)
    }
}
