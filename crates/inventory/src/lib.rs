//! Cold-storage inventory domain.
//!
//! This crate contains the billing rule and the record/history types,
//! implemented purely as deterministic domain logic (no IO, no storage).

pub mod billing;
pub mod history;
pub mod record;

pub use billing::{compute_bill, days_stored};
pub use history::{ChangeKind, HistoryEntry};
pub use record::{InventoryRecord, StorageForm};
