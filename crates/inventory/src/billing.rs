//! Storage billing rule.
//!
//! The bill for a stored lot is `days stored * daily rate * quantity`. The
//! interval is not checked here: a reversed interval yields a negative number
//! of days and therefore a negative amount. Callers that want to refuse such
//! input do so before reaching this module (see `StorageForm::ensure_ordered_interval`).

use chrono::NaiveDate;

/// Whole calendar days between `start` and `end` (negative when `end < start`).
pub fn days_stored(start: NaiveDate, end: NaiveDate) -> i64 {
    end.signed_duration_since(start).num_days()
}

/// Compute the bill amount for a storage interval.
pub fn compute_bill(start: NaiveDate, end: NaiveDate, rate_per_day: f64, quantity: i64) -> f64 {
    days_stored(start, end) as f64 * rate_per_day * quantity as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn wheat_bags_are_billed_for_ten_days() {
        let start = date(2024, 1, 1);
        let end = date(2024, 1, 11);

        assert_eq!(days_stored(start, end), 10);
        assert_eq!(compute_bill(start, end, 5.0, 10), 500.0);
    }

    #[test]
    fn interval_crossing_leap_day_counts_calendar_days() {
        assert_eq!(days_stored(date(2024, 2, 28), date(2024, 3, 1)), 2);
        assert_eq!(days_stored(date(2023, 2, 28), date(2023, 3, 1)), 1);
    }

    #[test]
    fn reversed_interval_yields_negative_amount() {
        let bill = compute_bill(date(2024, 1, 11), date(2024, 1, 1), 5.0, 10);
        assert_eq!(bill, -500.0);
    }

    #[test]
    fn zero_quantity_or_rate_bills_nothing() {
        let (start, end) = (date(2024, 5, 1), date(2024, 6, 1));
        assert_eq!(compute_bill(start, end, 12.5, 0), 0.0);
        assert_eq!(compute_bill(start, end, 0.0, 40), 0.0);
    }

    fn base_date() -> NaiveDate {
        date(2000, 1, 1)
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: ordered intervals with non-negative inputs bill a
        /// non-negative amount equal to days * rate * quantity.
        #[test]
        fn ordered_interval_bill_matches_formula(
            offset in 0i64..20_000,
            length in 0i64..3_650,
            rate in 0.0f64..10_000.0,
            quantity in 0i64..1_000_000,
        ) {
            let start = base_date() + chrono::Duration::days(offset);
            let end = start + chrono::Duration::days(length);

            let bill = compute_bill(start, end, rate, quantity);

            prop_assert!(bill >= 0.0);
            prop_assert_eq!(days_stored(start, end), length);
            prop_assert_eq!(bill, length as f64 * rate * quantity as f64);
        }

        /// Property: a same-day interval always bills zero.
        #[test]
        fn same_day_interval_bills_zero(
            offset in 0i64..20_000,
            rate in 0.0f64..10_000.0,
            quantity in 0i64..1_000_000,
        ) {
            let day = base_date() + chrono::Duration::days(offset);
            prop_assert_eq!(compute_bill(day, day, rate, quantity), 0.0);
        }
    }
}
