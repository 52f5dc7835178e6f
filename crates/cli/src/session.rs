//! Edit session state.
//!
//! "Load before edit" is modelled as a value the caller owns: a session either
//! has a record loaded (submit updates it) or not (submit creates a new one).

use coldstore_core::{DomainError, RecordId};
use coldstore_infra::{RecordStore, StoreError, StoreResult};
use coldstore_inventory::{InventoryRecord, StorageForm};

/// Result of submitting a form through an [`EditSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Created(RecordId),
    Updated(RecordId),
    /// The loaded record disappeared before the form was submitted; nothing
    /// was written.
    Vanished(RecordId),
}

#[derive(Debug, Default)]
pub struct EditSession {
    loaded: Option<InventoryRecord>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(&self) -> Option<&InventoryRecord> {
        self.loaded.as_ref()
    }

    /// Load record `id` for editing.
    pub async fn load<S>(&mut self, store: &S, id: RecordId) -> StoreResult<&InventoryRecord>
    where
        S: RecordStore + ?Sized,
    {
        let record = store
            .find_by_id(id)
            .await?
            .ok_or(StoreError::Domain(DomainError::not_found()))?;

        tracing::debug!(record_id = %id, "record loaded for editing");
        let record = self.loaded.insert(record);
        Ok(&*record)
    }

    /// Pre-filled form for the loaded record.
    pub fn draft(&self) -> Option<StorageForm> {
        self.loaded.as_ref().map(InventoryRecord::form)
    }

    /// Forget the loaded record; the next submit creates.
    pub fn clear(&mut self) {
        self.loaded = None;
    }

    /// Save `form`: update the loaded record, or create a new one.
    ///
    /// The session is cleared after a successful submit. On error the loaded
    /// record is kept so the user can correct the form and retry.
    pub async fn submit<S>(&mut self, store: &S, form: StorageForm) -> StoreResult<Submission>
    where
        S: RecordStore + ?Sized,
    {
        let submission = match &self.loaded {
            Some(record) => {
                let id = record.id;
                if store.update(id, form).await? {
                    Submission::Updated(id)
                } else {
                    Submission::Vanished(id)
                }
            }
            None => Submission::Created(store.create(form).await?),
        };

        self.clear();
        Ok(submission)
    }
}
