//! SQLite-backed record store.
//!
//! ## Connection handling
//!
//! The store owns a single-connection `SqlitePool`: one writer, matching the
//! single interactive user. The pool is opened by [`SqliteRecordStore::open`]
//! and released by [`SqliteRecordStore::close`]; callers own the store for the
//! length of their session and pass it explicitly.
//!
//! ## Transactions
//!
//! Every mutation runs inside its own transaction together with the history
//! entry it produces. A transaction that is dropped before `commit` rolls back,
//! so early returns through `?` never leave the connection mid-transaction.
//!
//! ## Error mapping
//!
//! | sqlx error | StoreError |
//! |------------|------------|
//! | `PoolClosed` | `Closed` |
//! | `ColumnDecode` / `Decode` | `CorruptRow` |
//! | anything else | `Storage { operation, .. }` |

use core::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::instrument;

use coldstore_core::{HistoryId, RecordId};
use coldstore_inventory::{ChangeKind, HistoryEntry, InventoryRecord, StorageForm};

use super::{RecordStore, StoreError, StoreResult, admit};
use crate::config::StoreConfig;
use crate::history::{self, CREATE_HISTORY_INDEX, CREATE_HISTORY_TABLE};

const DATE_FORMAT: &str = "%Y-%m-%d";

const CREATE_INVENTORY_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS inventory (
        id            INTEGER PRIMARY KEY,
        name          TEXT NOT NULL,
        tax_id        TEXT NOT NULL,
        start_date    TEXT NOT NULL,
        end_date      TEXT NOT NULL,
        quantity      INTEGER NOT NULL,
        rate_per_day  REAL NOT NULL,
        bill_amount   REAL NOT NULL
    )
"#;

const SELECT_INVENTORY: &str = r#"
    SELECT id, name, tax_id, start_date, end_date, quantity, rate_per_day, bill_amount
    FROM inventory
"#;

const SELECT_HISTORY: &str = r#"
    SELECT
        id,
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
    FROM history
"#;

#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
    config: StoreConfig,
}

impl SqliteRecordStore {
    /// Open (creating if missing) the database named by `config.database_url`
    /// and ensure the schema exists.
    #[instrument(skip(config), fields(database_url = %config.database_url), err)]
    pub async fn open(config: StoreConfig) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| map_sqlx_error("parse_database_url", e))?
            .create_if_missing(true);

        // One long-lived connection: `sqlite::memory:` databases live exactly as
        // long as their connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self { pool, config };
        store.ensure_schema().await?;

        tracing::debug!(history = %store.config.history, "record store opened");
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Release the connection. Pending work has already been committed or
    /// rolled back by the time any operation returns.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::debug!("record store closed");
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        for (operation, ddl) in [
            ("create_inventory_table", CREATE_INVENTORY_TABLE),
            ("create_history_table", CREATE_HISTORY_TABLE),
            ("create_history_index", CREATE_HISTORY_INDEX),
        ] {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(operation, e))?;
        }
        Ok(())
    }

    /// Delete the rows selected by `key` inside one transaction, logging a
    /// snapshot of each when the history policy asks for it.
    async fn delete_matching(&self, key: DeleteKey<'_>) -> StoreResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let snapshots = if self.config.history.logs(ChangeKind::Deleted) {
            key.select(&mut tx).await?
        } else {
            Vec::new()
        };

        let removed = key.delete(&mut tx).await?;

        for record in &snapshots {
            history::log_change(&mut tx, record, ChangeKind::Deleted).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(removed)
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    #[instrument(skip(self, form), fields(name = %form.name), err)]
    async fn create(&self, form: StorageForm) -> StoreResult<RecordId> {
        admit(&form, &self.config)?;
        let bill_amount = form.bill_amount();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let result = sqlx::query(
            r#"
            INSERT INTO inventory (
                name,
                tax_id,
                start_date,
                end_date,
                quantity,
                rate_per_day,
                bill_amount
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&form.name)
        .bind(&form.tax_id)
        .bind(format_date(form.start_date))
        .bind(format_date(form.end_date))
        .bind(form.quantity)
        .bind(form.rate_per_day)
        .bind(bill_amount)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_inventory", e))?;

        let id = RecordId::new(result.last_insert_rowid());

        if self.config.history.logs(ChangeKind::Created) {
            let record = InventoryRecord::from_form(id, form);
            history::log_change(&mut tx, &record, ChangeKind::Created).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(record_id = %id, bill_amount, "inventory record created");
        Ok(id)
    }

    #[instrument(skip(self), err)]
    async fn find_by_id(&self, id: RecordId) -> StoreResult<Option<InventoryRecord>> {
        let row = sqlx::query(&format!("{SELECT_INVENTORY} WHERE id = ?1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?;

        row.as_ref().map(record_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<InventoryRecord>> {
        let row = sqlx::query(&format!(
            "{SELECT_INVENTORY} WHERE name = ?1 ORDER BY id ASC LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_name", e))?;

        row.as_ref().map(record_from_row).transpose()
    }

    #[instrument(skip(self, form), fields(name = %form.name), err)]
    async fn update(&self, id: RecordId, form: StorageForm) -> StoreResult<bool> {
        admit(&form, &self.config)?;
        let bill_amount = form.bill_amount();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET name = ?1,
                tax_id = ?2,
                start_date = ?3,
                end_date = ?4,
                quantity = ?5,
                rate_per_day = ?6,
                bill_amount = ?7
            WHERE id = ?8
            "#,
        )
        .bind(&form.name)
        .bind(&form.tax_id)
        .bind(format_date(form.start_date))
        .bind(format_date(form.end_date))
        .bind(form.quantity)
        .bind(form.rate_per_day)
        .bind(bill_amount)
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_inventory", e))?;

        let updated = result.rows_affected() > 0;

        if updated && self.config.history.logs(ChangeKind::Updated) {
            let record = InventoryRecord::from_form(id, form);
            history::log_change(&mut tx, &record, ChangeKind::Updated).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        if updated {
            tracing::info!(record_id = %id, bill_amount, "inventory record updated");
        } else {
            tracing::warn!(record_id = %id, "update matched no inventory record");
        }
        Ok(updated)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: RecordId) -> StoreResult<bool> {
        let removed = self.delete_matching(DeleteKey::Id(id)).await?;
        if removed == 0 {
            tracing::warn!(record_id = %id, "delete matched no inventory record");
        } else {
            tracing::info!(record_id = %id, "inventory record deleted");
        }
        Ok(removed > 0)
    }

    #[instrument(skip(self), err)]
    async fn delete_by_name(&self, name: &str) -> StoreResult<u64> {
        let removed = self.delete_matching(DeleteKey::Name(name)).await?;
        if removed == 0 {
            tracing::warn!(name, "delete matched no inventory record");
        } else {
            tracing::info!(name, removed, "inventory records deleted by name");
        }
        Ok(removed)
    }

    #[instrument(skip(self), err)]
    async fn list_all(&self) -> StoreResult<Vec<InventoryRecord>> {
        let rows = sqlx::query(&format!("{SELECT_INVENTORY} ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_all", e))?;

        rows.iter().map(record_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn history_for(&self, inventory_id: RecordId) -> StoreResult<Vec<HistoryEntry>> {
        let rows = sqlx::query(&format!(
            "{SELECT_HISTORY} WHERE inventory_id = ?1 ORDER BY id ASC"
        ))
        .bind(inventory_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("history_for", e))?;

        rows.iter().map(history_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn history_all(&self) -> StoreResult<Vec<HistoryEntry>> {
        let rows = sqlx::query(&format!("{SELECT_HISTORY} ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("history_all", e))?;

        rows.iter().map(history_from_row).collect()
    }
}

/// Row selector shared by `delete` and `delete_by_name`.
#[derive(Debug, Clone, Copy)]
enum DeleteKey<'a> {
    Id(RecordId),
    Name(&'a str),
}

impl DeleteKey<'_> {
    async fn select(&self, conn: &mut SqliteConnection) -> StoreResult<Vec<InventoryRecord>> {
        let rows = match self {
            DeleteKey::Id(id) => {
                sqlx::query(&format!("{SELECT_INVENTORY} WHERE id = ?1"))
                    .bind(id.get())
                    .fetch_all(&mut *conn)
                    .await
            }
            DeleteKey::Name(name) => {
                sqlx::query(&format!("{SELECT_INVENTORY} WHERE name = ?1 ORDER BY id ASC"))
                    .bind(*name)
                    .fetch_all(&mut *conn)
                    .await
            }
        }
        .map_err(|e| map_sqlx_error("select_for_delete", e))?;

        rows.iter().map(record_from_row).collect()
    }

    async fn delete(&self, conn: &mut SqliteConnection) -> StoreResult<u64> {
        let result = match self {
            DeleteKey::Id(id) => {
                sqlx::query("DELETE FROM inventory WHERE id = ?1")
                    .bind(id.get())
                    .execute(&mut *conn)
                    .await
            }
            DeleteKey::Name(name) => {
                sqlx::query("DELETE FROM inventory WHERE name = ?1")
                    .bind(*name)
                    .execute(&mut *conn)
                    .await
            }
        }
        .map_err(|e| map_sqlx_error("delete_inventory", e))?;

        Ok(result.rows_affected())
    }
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(column: &str, text: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|e| StoreError::CorruptRow(format!("{column} {text:?}: {e}")))
}

fn record_from_row(row: &SqliteRow) -> StoreResult<InventoryRecord> {
    let start_date: String = get(row, "start_date")?;
    let end_date: String = get(row, "end_date")?;

    Ok(InventoryRecord {
        id: RecordId::new(get(row, "id")?),
        name: get(row, "name")?,
        tax_id: get(row, "tax_id")?,
        start_date: parse_date("start_date", &start_date)?,
        end_date: parse_date("end_date", &end_date)?,
        quantity: get(row, "quantity")?,
        rate_per_day: get(row, "rate_per_day")?,
        bill_amount: get(row, "bill_amount")?,
    })
}

fn history_from_row(row: &SqliteRow) -> StoreResult<HistoryEntry> {
    let start_date: String = get(row, "start_date")?;
    let end_date: String = get(row, "end_date")?;
    let timestamp: String = get(row, "timestamp")?;
    let change: String = get(row, "change_kind")?;

    Ok(HistoryEntry {
        id: HistoryId::new(get(row, "id")?),
        inventory_id: RecordId::new(get(row, "inventory_id")?),
        name: get(row, "name")?,
        tax_id: get(row, "tax_id")?,
        start_date: parse_date("start_date", &start_date)?,
        end_date: parse_date("end_date", &end_date)?,
        quantity: get(row, "quantity")?,
        rate_per_day: get(row, "rate_per_day")?,
        bill_amount: get(row, "bill_amount")?,
        timestamp: history::parse_timestamp(&timestamp)?,
        change: change
            .parse::<ChangeKind>()
            .map_err(|e| StoreError::CorruptRow(e.to_string()))?,
    })
}

fn get<'r, T>(row: &'r SqliteRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(|e| map_sqlx_error("decode_row", e))
}

pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolClosed => StoreError::Closed,
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::CorruptRow(format!("column {index}: {source}"))
        }
        sqlx::Error::Decode(source) => StoreError::CorruptRow(source.to_string()),
        sqlx::Error::Database(db_err) => StoreError::Storage {
            operation,
            message: db_err.message().to_string(),
        },
        other => StoreError::Storage {
            operation,
            message: other.to_string(),
        },
    }
}
