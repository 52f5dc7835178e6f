//! Inventory record storage.
//!
//! `RecordStore` is the seam between the interaction shell and persistence.
//! [`SqliteRecordStore`] is the file-backed implementation;
//! [`InMemoryRecordStore`] mirrors its semantics for tests and dry runs.
//!
//! Mutations are fire-and-forget with respect to missing rows: updating or
//! deleting a record that does not exist is not an error, the return value
//! just reports that nothing matched.

pub mod in_memory;
pub mod sqlite;

#[cfg(test)]
mod conformance;

use async_trait::async_trait;

use coldstore_core::{DomainError, RecordId};
use coldstore_inventory::{HistoryEntry, InventoryRecord, StorageForm};

use crate::config::StoreConfig;

pub use in_memory::InMemoryRecordStore;
pub use sqlite::SqliteRecordStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Record store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The submission was refused before touching storage.
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("storage error in {operation}: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },
    /// A stored row could not be decoded (e.g. an unparsable date).
    #[error("corrupt row: {0}")]
    CorruptRow(String),
    #[error("store is closed")]
    Closed,
}

/// What a quick-add submission did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new record, computing its bill amount. Returns the assigned id.
    async fn create(&self, form: StorageForm) -> StoreResult<RecordId>;

    async fn find_by_id(&self, id: RecordId) -> StoreResult<Option<InventoryRecord>>;

    /// Exact-match lookup; the lowest id wins when several records share a name.
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<InventoryRecord>>;

    /// Overwrite every field of record `id` and recompute its bill amount.
    ///
    /// Returns `false` (not an error) when no record matched.
    async fn update(&self, id: RecordId, form: StorageForm) -> StoreResult<bool>;

    /// Remove record `id`. Returns whether a record was removed.
    async fn delete(&self, id: RecordId) -> StoreResult<bool>;

    /// Remove every record named `name`. Returns the number removed.
    async fn delete_by_name(&self, name: &str) -> StoreResult<u64>;

    /// All records, ordered by id ascending.
    async fn list_all(&self) -> StoreResult<Vec<InventoryRecord>>;

    /// Audit entries for one record, oldest first.
    async fn history_for(&self, inventory_id: RecordId) -> StoreResult<Vec<HistoryEntry>>;

    /// Every audit entry, oldest first.
    async fn history_all(&self) -> StoreResult<Vec<HistoryEntry>>;

    /// Quick add: update the record carrying `form.name` if there is one,
    /// otherwise create it.
    ///
    /// When several records share the name only the one [`find_by_name`]
    /// returns (lowest id) is overwritten, so the returned id names exactly
    /// the row that changed. Unlike [`delete_by_name`], the other duplicates
    /// are left alone.
    ///
    /// [`find_by_name`]: RecordStore::find_by_name
    /// [`delete_by_name`]: RecordStore::delete_by_name
    async fn upsert_by_name(&self, form: StorageForm) -> StoreResult<(RecordId, UpsertOutcome)> {
        match self.find_by_name(&form.name).await? {
            Some(existing) => {
                self.update(existing.id, form).await?;
                Ok((existing.id, UpsertOutcome::Updated))
            }
            None => {
                let id = self.create(form).await?;
                Ok((id, UpsertOutcome::Created))
            }
        }
    }
}

/// Apply field validation and the configured interval policy to a submission.
pub(crate) fn admit(form: &StorageForm, config: &StoreConfig) -> StoreResult<()> {
    form.validate()?;
    if form.is_reversed() {
        if config.reject_reversed_intervals {
            form.ensure_ordered_interval()?;
        }
        tracing::warn!(
            name = %form.name,
            start_date = %form.start_date,
            end_date = %form.end_date,
            "end date precedes start date; bill amount will be negative"
        );
    }
    Ok(())
}
