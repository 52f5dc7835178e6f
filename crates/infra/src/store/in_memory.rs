//! In-memory record store for tests/dev.
//!
//! Identity assignment follows SQLite: records take `max(id) + 1` (so the id
//! of a deleted last record can be reused), history ids never repeat.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use coldstore_core::{Entity, HistoryId, RecordId};
use coldstore_inventory::{ChangeKind, HistoryEntry, InventoryRecord, StorageForm};

use super::{RecordStore, StoreError, StoreResult, admit};
use crate::config::StoreConfig;
use crate::history::next_timestamp;

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<RecordId, InventoryRecord>,
    history: Vec<HistoryEntry>,
    last_history_id: i64,
}

impl State {
    fn next_record_id(&self) -> RecordId {
        let last = self.records.keys().next_back().map_or(0, |id| id.get());
        RecordId::new(last + 1)
    }

    fn log(&mut self, record: &InventoryRecord, change: ChangeKind) {
        let previous = self
            .history
            .iter()
            .rev()
            .find(|e| e.inventory_id == record.id)
            .map(|e| e.timestamp);

        self.last_history_id += 1;
        let entry = HistoryEntry::capture(
            HistoryId::new(self.last_history_id),
            record,
            change,
            next_timestamp(previous, Utc::now()),
        );
        self.history.push(entry);
    }
}

#[derive(Debug)]
pub struct InMemoryRecordStore {
    config: StoreConfig,
    inner: RwLock<State>,
}

impl InMemoryRecordStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(State::default()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, State>> {
        self.inner.read().map_err(|_| poisoned())
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, State>> {
        self.inner.write().map_err(|_| poisoned())
    }

    fn remove_where(&self, matches: impl Fn(&InventoryRecord) -> bool) -> StoreResult<u64> {
        let mut state = self.write()?;

        let doomed: Vec<RecordId> = state
            .records
            .values()
            .filter(|&r| matches(r))
            .map(Entity::id)
            .collect();

        for id in &doomed {
            if let Some(record) = state.records.remove(id) {
                if self.config.history.logs(ChangeKind::Deleted) {
                    state.log(&record, ChangeKind::Deleted);
                }
            }
        }

        Ok(doomed.len() as u64)
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new(StoreConfig::in_memory())
    }
}

fn poisoned() -> StoreError {
    StoreError::Storage {
        operation: "lock",
        message: "in-memory store lock poisoned".to_string(),
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create(&self, form: StorageForm) -> StoreResult<RecordId> {
        admit(&form, &self.config)?;

        let mut state = self.write()?;
        let id = state.next_record_id();
        let record = InventoryRecord::from_form(id, form);

        if self.config.history.logs(ChangeKind::Created) {
            state.log(&record, ChangeKind::Created);
        }
        state.records.insert(id, record);

        Ok(id)
    }

    async fn find_by_id(&self, id: RecordId) -> StoreResult<Option<InventoryRecord>> {
        Ok(self.read()?.records.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<InventoryRecord>> {
        Ok(self
            .read()?
            .records
            .values()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn update(&self, id: RecordId, form: StorageForm) -> StoreResult<bool> {
        admit(&form, &self.config)?;

        let mut state = self.write()?;
        if !state.records.contains_key(&id) {
            return Ok(false);
        }

        let record = InventoryRecord::from_form(id, form);
        if self.config.history.logs(ChangeKind::Updated) {
            state.log(&record, ChangeKind::Updated);
        }
        state.records.insert(id, record);

        Ok(true)
    }

    async fn delete(&self, id: RecordId) -> StoreResult<bool> {
        Ok(self.remove_where(|r| r.id == id)? > 0)
    }

    async fn delete_by_name(&self, name: &str) -> StoreResult<u64> {
        self.remove_where(|r| r.name == name)
    }

    async fn list_all(&self) -> StoreResult<Vec<InventoryRecord>> {
        Ok(self.read()?.records.values().cloned().collect())
    }

    async fn history_for(&self, inventory_id: RecordId) -> StoreResult<Vec<HistoryEntry>> {
        Ok(self
            .read()?
            .history
            .iter()
            .filter(|e| e.inventory_id == inventory_id)
            .cloned()
            .collect())
    }

    async fn history_all(&self) -> StoreResult<Vec<HistoryEntry>> {
        Ok(self.read()?.history.clone())
    }
}
