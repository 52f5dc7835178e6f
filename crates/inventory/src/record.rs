//! Inventory records and the form they are created from.
//!
//! A record's `bill_amount` is derived from its form when the record is built
//! and is stored as is; reads never recompute it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use coldstore_core::{DomainError, DomainResult, Entity, RecordId};

use crate::billing;

/// Field values supplied on an add/update submission.
///
/// This is everything an inventory record holds except its identity and the
/// derived bill amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageForm {
    pub name: String,
    pub tax_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub quantity: i64,
    pub rate_per_day: f64,
}

impl StorageForm {
    /// Check field-level constraints.
    ///
    /// A reversed interval is not a field error; see [`Self::ensure_ordered_interval`].
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        if !self.rate_per_day.is_finite() {
            return Err(DomainError::validation("rate per day must be a finite number"));
        }
        if self.rate_per_day < 0.0 {
            return Err(DomainError::validation("rate per day cannot be negative"));
        }
        Ok(())
    }

    /// Reject intervals whose end date precedes the start date.
    pub fn ensure_ordered_interval(&self) -> DomainResult<()> {
        if self.is_reversed() {
            return Err(DomainError::validation(format!(
                "end date {} is before start date {}",
                self.end_date, self.start_date
            )));
        }
        Ok(())
    }

    pub fn is_reversed(&self) -> bool {
        self.end_date < self.start_date
    }

    pub fn days_stored(&self) -> i64 {
        billing::days_stored(self.start_date, self.end_date)
    }

    pub fn bill_amount(&self) -> f64 {
        billing::compute_bill(self.start_date, self.end_date, self.rate_per_day, self.quantity)
    }
}

/// A stored lot of goods and its bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: RecordId,
    pub name: String,
    pub tax_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub quantity: i64,
    pub rate_per_day: f64,
    /// Stored redundantly; recomputed on every create/update, never on read.
    pub bill_amount: f64,
}

impl InventoryRecord {
    /// Build a record from a submission, computing the bill amount.
    pub fn from_form(id: RecordId, form: StorageForm) -> Self {
        let bill_amount = form.bill_amount();
        Self {
            id,
            name: form.name,
            tax_id: form.tax_id,
            start_date: form.start_date,
            end_date: form.end_date,
            quantity: form.quantity,
            rate_per_day: form.rate_per_day,
            bill_amount,
        }
    }

    /// The editable fields of this record, e.g. to pre-fill an edit session.
    pub fn form(&self) -> StorageForm {
        StorageForm {
            name: self.name.clone(),
            tax_id: self.tax_id.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            quantity: self.quantity,
            rate_per_day: self.rate_per_day,
        }
    }

    pub fn days_stored(&self) -> i64 {
        billing::days_stored(self.start_date, self.end_date)
    }
}

impl Entity for InventoryRecord {
    type Id = RecordId;

    fn id(&self) -> RecordId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wheat_form() -> StorageForm {
        StorageForm {
            name: "Wheat Bags".to_string(),
            tax_id: "GST123".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
            quantity: 10,
            rate_per_day: 5.0,
        }
    }

    #[test]
    fn from_form_computes_bill_amount() {
        let record = InventoryRecord::from_form(RecordId::new(1), wheat_form());
        assert_eq!(record.bill_amount, 500.0);
        assert_eq!(record.days_stored(), 10);
        assert_eq!(record.form(), wheat_form());
        assert_eq!(Entity::id(&record), RecordId::new(1));
    }

    #[test]
    fn blank_name_fails_validation() {
        let form = StorageForm {
            name: "   ".to_string(),
            ..wheat_form()
        };
        assert!(matches!(form.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn negative_quantity_and_rate_fail_validation() {
        let form = StorageForm {
            quantity: -1,
            ..wheat_form()
        };
        assert!(form.validate().is_err());

        let form = StorageForm {
            rate_per_day: -0.5,
            ..wheat_form()
        };
        assert!(form.validate().is_err());

        let form = StorageForm {
            rate_per_day: f64::NAN,
            ..wheat_form()
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn reversed_interval_is_valid_but_not_ordered() {
        let form = StorageForm {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ..wheat_form()
        };

        assert!(form.validate().is_ok());
        assert!(form.is_reversed());
        assert!(form.ensure_ordered_interval().is_err());
        assert_eq!(form.bill_amount(), -500.0);
    }
}
