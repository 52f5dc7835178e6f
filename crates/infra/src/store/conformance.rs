//! Behaviour every `RecordStore` implementation must share.
//!
//! Each helper drives a freshly opened, empty store.

use chrono::NaiveDate;

use coldstore_core::{DomainError, RecordId};
use coldstore_inventory::{ChangeKind, StorageForm};

use super::{RecordStore, StoreError, UpsertOutcome};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn wheat_bags() -> StorageForm {
    StorageForm {
        name: "Wheat Bags".to_string(),
        tax_id: "GST123".to_string(),
        start_date: date(2024, 1, 1),
        end_date: date(2024, 1, 11),
        quantity: 10,
        rate_per_day: 5.0,
    }
}

fn potato_sacks() -> StorageForm {
    StorageForm {
        name: "Potato Sacks".to_string(),
        tax_id: "GST456".to_string(),
        start_date: date(2024, 2, 1),
        end_date: date(2024, 2, 15),
        quantity: 3,
        rate_per_day: 1.5,
    }
}

pub async fn create_then_read<S: RecordStore>(store: &S) {
    let id = store.create(wheat_bags()).await.unwrap();

    let record = store.find_by_id(id).await.unwrap().expect("record exists");
    assert_eq!(record.id, id);
    assert_eq!(record.form(), wheat_bags());
    assert_eq!(record.days_stored(), 10);
    assert_eq!(record.bill_amount, 500.0);

    let by_name = store.find_by_name("Wheat Bags").await.unwrap();
    assert_eq!(by_name, Some(record));
    assert_eq!(store.find_by_name("wheat bags").await.unwrap(), None);
    assert_eq!(store.find_by_id(RecordId::new(id.get() + 1)).await.unwrap(), None);
}

pub async fn update_overwrites_all_fields<S: RecordStore>(store: &S) {
    let id = store.create(wheat_bags()).await.unwrap();

    let updated = store.update(id, potato_sacks()).await.unwrap();
    assert!(updated);

    let record = store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(record.form(), potato_sacks());
    assert_eq!(record.bill_amount, 14.0 * 1.5 * 3.0);
    assert_eq!(store.find_by_name("Wheat Bags").await.unwrap(), None);
}

pub async fn update_missing_is_no_op<S: RecordStore>(store: &S) {
    let id = store.create(wheat_bags()).await.unwrap();
    let before = store.list_all().await.unwrap();

    let updated = store
        .update(RecordId::new(id.get() + 100), potato_sacks())
        .await
        .unwrap();

    assert!(!updated);
    assert_eq!(store.list_all().await.unwrap(), before);
    assert!(store.history_all().await.unwrap().is_empty());
}

pub async fn delete_semantics<S: RecordStore>(store: &S) {
    let wheat = store.create(wheat_bags()).await.unwrap();
    let potato = store.create(potato_sacks()).await.unwrap();

    assert!(store.delete(wheat).await.unwrap());
    let remaining = store.list_all().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, potato);

    // Missing keys: no error, no change.
    assert!(!store.delete(wheat).await.unwrap());
    assert_eq!(store.delete_by_name("Frozen Peas").await.unwrap(), 0);
    assert_eq!(store.list_all().await.unwrap(), remaining);

    assert_eq!(store.delete_by_name("Potato Sacks").await.unwrap(), 1);
    assert!(store.list_all().await.unwrap().is_empty());
}

pub async fn list_all_orders_by_id<S: RecordStore>(store: &S) {
    let first = store.create(potato_sacks()).await.unwrap();
    let second = store.create(wheat_bags()).await.unwrap();
    let third = store.create(potato_sacks()).await.unwrap();

    let ids: Vec<RecordId> = store
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();

    assert_eq!(ids, vec![first, second, third]);
    assert!(first < second && second < third);

    // Duplicate names are allowed; lookup by name picks the lowest id, and
    // delete by name removes them all.
    assert_eq!(store.find_by_name("Potato Sacks").await.unwrap().unwrap().id, first);
    assert_eq!(store.delete_by_name("Potato Sacks").await.unwrap(), 2);
}

pub async fn upsert_by_name<S: RecordStore>(store: &S) {
    let (id, outcome) = store.upsert_by_name(wheat_bags()).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Created);

    let resubmitted = StorageForm {
        quantity: 20,
        ..wheat_bags()
    };
    let (again, outcome) = store.upsert_by_name(resubmitted).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Updated);
    assert_eq!(again, id);

    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].quantity, 20);
    assert_eq!(all[0].bill_amount, 1000.0);
}

pub async fn upsert_with_duplicate_names_touches_lowest_id<S: RecordStore>(store: &S) {
    let first = store.create(wheat_bags()).await.unwrap();
    let second = store.create(wheat_bags()).await.unwrap();

    let resubmitted = StorageForm {
        quantity: 20,
        ..wheat_bags()
    };
    let (id, outcome) = store.upsert_by_name(resubmitted).await.unwrap();
    assert_eq!((id, outcome), (first, UpsertOutcome::Updated));

    assert_eq!(store.find_by_id(first).await.unwrap().unwrap().quantity, 20);
    assert_eq!(store.find_by_id(second).await.unwrap().unwrap().quantity, 10);
}

pub async fn updates_append_history<S: RecordStore>(store: &S) {
    let id = store.create(wheat_bags()).await.unwrap();
    // Default policy: creation is not logged.
    assert!(store.history_for(id).await.unwrap().is_empty());

    let revisions = [
        StorageForm {
            quantity: 12,
            ..wheat_bags()
        },
        StorageForm {
            end_date: date(2024, 1, 21),
            ..wheat_bags()
        },
        potato_sacks(),
    ];

    for (n, form) in revisions.into_iter().enumerate() {
        store.update(id, form).await.unwrap();

        let history = store.history_for(id).await.unwrap();
        assert_eq!(history.len(), n + 1);

        let current = store.find_by_id(id).await.unwrap().unwrap();
        let latest = history.last().unwrap();
        assert_eq!(latest.change, ChangeKind::Updated);
        assert_eq!(latest.snapshot(), current);
    }

    let history = store.history_for(id).await.unwrap();
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(history.windows(2).all(|w| w[0].id < w[1].id));
}

pub async fn all_mutations_logged<S: RecordStore>(store: &S) {
    let id = store.create(wheat_bags()).await.unwrap();
    store.update(id, potato_sacks()).await.unwrap();
    store.delete(id).await.unwrap();

    let history = store.history_for(id).await.unwrap();
    let kinds: Vec<ChangeKind> = history.iter().map(|e| e.change).collect();
    assert_eq!(
        kinds,
        vec![ChangeKind::Created, ChangeKind::Updated, ChangeKind::Deleted]
    );
    assert_eq!(history[0].bill_amount, 500.0);
    // The deleted snapshot is the last state the record had.
    assert_eq!(history[2].name, "Potato Sacks");

    // History outlives the record it points at.
    assert_eq!(store.find_by_id(id).await.unwrap(), None);
    assert_eq!(store.history_all().await.unwrap().len(), 3);
}

pub async fn nothing_logged<S: RecordStore>(store: &S) {
    let id = store.create(wheat_bags()).await.unwrap();
    store.update(id, potato_sacks()).await.unwrap();
    store.delete(id).await.unwrap();

    assert!(store.history_all().await.unwrap().is_empty());
}

pub async fn reversed_interval_allowed<S: RecordStore>(store: &S) {
    let reversed = StorageForm {
        start_date: date(2024, 1, 11),
        end_date: date(2024, 1, 1),
        ..wheat_bags()
    };

    let id = store.create(reversed).await.unwrap();
    let record = store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(record.days_stored(), -10);
    assert_eq!(record.bill_amount, -500.0);
}

pub async fn reversed_interval_rejected<S: RecordStore>(store: &S) {
    let reversed = StorageForm {
        start_date: date(2024, 1, 11),
        end_date: date(2024, 1, 1),
        ..wheat_bags()
    };

    let err = store.create(reversed.clone()).await.unwrap_err();
    assert!(matches!(err, StoreError::Domain(DomainError::Validation(_))));

    let id = store.create(wheat_bags()).await.unwrap();
    let err = store.update(id, reversed).await.unwrap_err();
    assert!(matches!(err, StoreError::Domain(DomainError::Validation(_))));

    let record = store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(record.form(), wheat_bags());
}

pub async fn invalid_submission_rejected<S: RecordStore>(store: &S) {
    let blank = StorageForm {
        name: String::new(),
        ..wheat_bags()
    };
    assert!(matches!(
        store.create(blank).await,
        Err(StoreError::Domain(DomainError::Validation(_)))
    ));

    let negative = StorageForm {
        quantity: -5,
        ..wheat_bags()
    };
    assert!(store.create(negative).await.is_err());
    assert!(store.list_all().await.unwrap().is_empty());
}
