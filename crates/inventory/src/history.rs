//! Audit trail entries.

use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use coldstore_core::{DomainError, Entity, HistoryId, RecordId};

use crate::record::InventoryRecord;

/// Which mutation produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Updated => "updated",
            ChangeKind::Deleted => "deleted",
        }
    }
}

impl core::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ChangeKind::Created),
            "updated" => Ok(ChangeKind::Updated),
            "deleted" => Ok(ChangeKind::Deleted),
            other => Err(DomainError::validation(format!("invalid change kind: {other}"))),
        }
    }
}

/// Immutable snapshot of an inventory record at the moment it changed.
///
/// `inventory_id` is a plain back-reference: the record it names may since
/// have been edited again or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryId,
    pub inventory_id: RecordId,
    pub name: String,
    pub tax_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub quantity: i64,
    pub rate_per_day: f64,
    pub bill_amount: f64,
    pub timestamp: DateTime<Utc>,
    pub change: ChangeKind,
}

impl HistoryEntry {
    /// Snapshot `record` as history entry `id`.
    pub fn capture(
        id: HistoryId,
        record: &InventoryRecord,
        change: ChangeKind,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            inventory_id: record.id,
            name: record.name.clone(),
            tax_id: record.tax_id.clone(),
            start_date: record.start_date,
            end_date: record.end_date,
            quantity: record.quantity,
            rate_per_day: record.rate_per_day,
            bill_amount: record.bill_amount,
            timestamp,
            change,
        }
    }

    /// The record state captured by this entry.
    pub fn snapshot(&self) -> InventoryRecord {
        InventoryRecord {
            id: self.inventory_id,
            name: self.name.clone(),
            tax_id: self.tax_id.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            quantity: self.quantity,
            rate_per_day: self.rate_per_day,
            bill_amount: self.bill_amount,
        }
    }
}

impl Entity for HistoryEntry {
    type Id = HistoryId;

    fn id(&self) -> HistoryId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::StorageForm;

    #[test]
    fn capture_then_snapshot_preserves_record() {
        let record = InventoryRecord::from_form(
            RecordId::new(7),
            StorageForm {
                name: "Frozen Peas".to_string(),
                tax_id: "GST-77".to_string(),
                start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
                quantity: 4,
                rate_per_day: 2.5,
            },
        );

        let entry = HistoryEntry::capture(HistoryId::new(1), &record, ChangeKind::Updated, Utc::now());

        assert_eq!(entry.inventory_id, record.id);
        assert_eq!(entry.snapshot(), record);
    }

    #[test]
    fn change_kind_parses_its_own_rendering() {
        for kind in [ChangeKind::Created, ChangeKind::Updated, ChangeKind::Deleted] {
            assert_eq!(kind.as_str().parse::<ChangeKind>().unwrap(), kind);
        }
        assert!("renamed".parse::<ChangeKind>().is_err());
    }
}
