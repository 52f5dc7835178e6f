//! Form input.
//!
//! Dates are optional at the argument level so that a bill can be previewed
//! before the form is complete; a submission requires both.

use anyhow::bail;
use chrono::NaiveDate;
use clap::Args;

use coldstore_core::RecordId;
use coldstore_inventory::{StorageForm, compute_bill};

/// Fields of an add/update submission.
#[derive(Debug, Clone, Args)]
pub struct FormArgs {
    /// Name of the stored goods.
    #[arg(long)]
    pub name: String,

    /// Tax (GST) identifier of the owner.
    #[arg(long = "tax-id", default_value = "")]
    pub tax_id: String,

    /// First day of storage (YYYY-MM-DD).
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day of storage (YYYY-MM-DD).
    #[arg(long)]
    pub end: Option<NaiveDate>,

    #[arg(long, default_value_t = 0)]
    pub quantity: i64,

    /// Rate charged per unit per day.
    #[arg(long, default_value_t = 0.0)]
    pub rate: f64,
}

impl FormArgs {
    /// Bill shown while filling in the form: zero until both dates are set.
    pub fn bill_preview(&self) -> f64 {
        bill_preview(self.start, self.end, self.rate, self.quantity)
    }

    pub fn into_form(self) -> anyhow::Result<StorageForm> {
        let (Some(start_date), Some(end_date)) = (self.start, self.end) else {
            bail!("both --start and --end dates are required to save an item");
        };

        Ok(StorageForm {
            name: self.name,
            tax_id: self.tax_id,
            start_date,
            end_date,
            quantity: self.quantity,
            rate_per_day: self.rate,
        })
    }
}

/// Field overrides applied to a loaded record.
#[derive(Debug, Clone, Args)]
pub struct EditArgs {
    /// Record to load.
    #[arg(long)]
    pub id: RecordId,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long = "tax-id")]
    pub tax_id: Option<String>,

    #[arg(long)]
    pub start: Option<NaiveDate>,

    #[arg(long)]
    pub end: Option<NaiveDate>,

    #[arg(long)]
    pub quantity: Option<i64>,

    #[arg(long)]
    pub rate: Option<f64>,
}

impl EditArgs {
    /// Overlay the given fields on a pre-filled form.
    pub fn apply(self, mut form: StorageForm) -> StorageForm {
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(tax_id) = self.tax_id {
            form.tax_id = tax_id;
        }
        if let Some(start) = self.start {
            form.start_date = start;
        }
        if let Some(end) = self.end {
            form.end_date = end;
        }
        if let Some(quantity) = self.quantity {
            form.quantity = quantity;
        }
        if let Some(rate) = self.rate {
            form.rate_per_day = rate;
        }
        form
    }
}

/// Inputs of a bill preview.
#[derive(Debug, Clone, Args)]
pub struct BillArgs {
    #[arg(long)]
    pub start: Option<NaiveDate>,

    #[arg(long)]
    pub end: Option<NaiveDate>,

    #[arg(long, default_value_t = 0)]
    pub quantity: i64,

    #[arg(long, default_value_t = 0.0)]
    pub rate: f64,
}

impl BillArgs {
    pub fn bill_preview(&self) -> f64 {
        bill_preview(self.start, self.end, self.rate, self.quantity)
    }
}

pub fn bill_preview(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    rate_per_day: f64,
    quantity: i64,
) -> f64 {
    match (start, end) {
        (Some(start), Some(end)) => compute_bill(start, end, rate_per_day, quantity),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn wheat_args() -> FormArgs {
        FormArgs {
            name: "Wheat Bags".to_string(),
            tax_id: "GST123".to_string(),
            start: Some(date(2024, 1, 1)),
            end: Some(date(2024, 1, 11)),
            quantity: 10,
            rate: 5.0,
        }
    }

    #[test]
    fn preview_is_zero_until_both_dates_are_present() {
        assert_eq!(bill_preview(None, None, 5.0, 10), 0.0);
        assert_eq!(bill_preview(Some(date(2024, 1, 1)), None, 5.0, 10), 0.0);
        assert_eq!(bill_preview(None, Some(date(2024, 1, 11)), 5.0, 10), 0.0);
        assert_eq!(wheat_args().bill_preview(), 500.0);
    }

    #[test]
    fn submission_requires_both_dates() {
        let args = FormArgs {
            end: None,
            ..wheat_args()
        };
        assert!(args.into_form().is_err());

        let form = wheat_args().into_form().unwrap();
        assert_eq!(form.bill_amount(), 500.0);
    }

    #[test]
    fn edit_overrides_only_given_fields() {
        let base = wheat_args().into_form().unwrap();
        let edit = EditArgs {
            id: RecordId::new(1),
            name: None,
            tax_id: None,
            start: None,
            end: Some(date(2024, 1, 21)),
            quantity: Some(4),
            rate: None,
        };

        let form = edit.apply(base.clone());
        assert_eq!(form.name, base.name);
        assert_eq!(form.end_date, date(2024, 1, 21));
        assert_eq!(form.quantity, 4);
        assert_eq!(form.bill_amount(), 20.0 * 5.0 * 4.0);
    }
}
