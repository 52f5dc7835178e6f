//! Append-only audit trail.
//!
//! Entries are written on the connection (usually an open transaction) of the
//! mutation they describe, so a rolled-back mutation leaves no history behind.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqliteConnection};

use coldstore_core::HistoryId;
use coldstore_inventory::{ChangeKind, InventoryRecord};

use crate::store::sqlite::{format_date, map_sqlx_error};
use crate::store::{StoreError, StoreResult};

pub(crate) const CREATE_HISTORY_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS history (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        inventory_id  INTEGER NOT NULL,
        name          TEXT NOT NULL,
        tax_id        TEXT NOT NULL,
        start_date    TEXT NOT NULL,
        end_date      TEXT NOT NULL,
        quantity      INTEGER NOT NULL,
        rate_per_day  REAL NOT NULL,
        bill_amount   REAL NOT NULL,
        timestamp     TEXT NOT NULL,
        change_kind   TEXT NOT NULL DEFAULT 'updated'
    )
"#;

pub(crate) const CREATE_HISTORY_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS history_by_inventory_id ON history (inventory_id, id)
"#;

/// Timestamp for a new entry: the wall clock, but never earlier than the
/// previous entry for the same record.
pub fn next_timestamp(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(previous) if previous > now => previous,
        _ => now,
    }
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(text: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::CorruptRow(format!("history timestamp {text:?}: {e}")))
}

/// Append one snapshot of `record` to the history table.
#[tracing::instrument(skip(conn, record), fields(inventory_id = %record.id, change = %change), err)]
pub async fn log_change(
    conn: &mut SqliteConnection,
    record: &InventoryRecord,
    change: ChangeKind,
) -> StoreResult<HistoryId> {
    let previous = sqlx::query(
        r#"
        SELECT timestamp
        FROM history
        WHERE inventory_id = ?1
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(record.id.get())
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("load_last_history_timestamp", e))?;

    let previous = match previous {
        Some(row) => {
            let text: String = row
                .try_get("timestamp")
                .map_err(|e| map_sqlx_error("decode_history_timestamp", e))?;
            Some(parse_timestamp(&text)?)
        }
        None => None,
    };
    let timestamp = next_timestamp(previous, Utc::now());

    let result = sqlx::query(
        r#"
        INSERT INTO history (
            inventory_id,
            name,
            tax_id,
            start_date,
            end_date,
            quantity,
            rate_per_day,
            bill_amount,
            timestamp,
            change_kind
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(record.id.get())
    .bind(&record.name)
    .bind(&record.tax_id)
    .bind(format_date(record.start_date))
    .bind(format_date(record.end_date))
    .bind(record.quantity)
    .bind(record.rate_per_day)
    .bind(record.bill_amount)
    .bind(format_timestamp(timestamp))
    .bind(change.as_str())
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("insert_history", e))?;

    Ok(HistoryId::new(result.last_insert_rowid()))
}
