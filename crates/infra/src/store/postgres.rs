//! Postgres-backed record store.
//!
//! Every logical table lives in one `records` table as a jsonb document keyed
//! by `(table_name, id)`. Equality filters use jsonb containment (`@>`);
//! ordering uses jsonb comparison on the named key, which orders numbers
//! numerically and strings lexicographically.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `InvalidRecord` (duplicate id) |
//! | Database (other) | Any other | `Database` |
//! | PoolClosed / Io / PoolTimedOut | N/A | `Unavailable` |
//! | Other | N/A | `Database` |

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use estatenest_core::RecordId;

use super::query::{Direction, RowQuery};
use super::r#trait::{RecordStore, StoreError};
use super::stamp_record;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    seq         BIGSERIAL   NOT NULL,
    table_name  TEXT        NOT NULL,
    id          UUID        NOT NULL,
    data        JSONB       NOT NULL,
    PRIMARY KEY (table_name, id)
);
CREATE INDEX IF NOT EXISTS records_table_seq_idx ON records (table_name, seq);
"#;

/// Postgres-backed record store.
///
/// `insert_many` runs in a single transaction. Separate calls are separate
/// transactions.
#[derive(Debug, Clone)]
pub struct PostgresRecordStore {
    pool: Arc<PgPool>,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and make sure the `records` table exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

/// Column names are interpolated into ORDER BY, so only plain identifiers pass.
fn checked_column(column: &str) -> Result<&str, StoreError> {
    let valid = !column.is_empty()
        && column
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(column)
    } else {
        Err(StoreError::InvalidRecord(format!("invalid column name: {column:?}")))
    }
}

fn record_id(row: &JsonValue) -> Result<uuid::Uuid, StoreError> {
    row.get("id")
        .and_then(JsonValue::as_str)
        .and_then(|s| s.parse::<uuid::Uuid>().ok())
        .ok_or_else(|| StoreError::InvalidRecord("record id must be a UUID string".to_string()))
}

fn select_sql(query: &RowQuery) -> Result<String, StoreError> {
    let mut sql = String::from("SELECT data FROM records WHERE table_name = $1 AND data @> $2");
    let mut clauses = Vec::with_capacity(query.order.len() + 1);
    for order in &query.order {
        let column = checked_column(&order.column)?;
        let direction = match order.direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        clauses.push(format!("data->'{column}' {direction}"));
    }
    let tie = match query.order.last().map(|o| o.direction) {
        Some(Direction::Descending) => "seq DESC",
        _ => "seq ASC",
    };
    clauses.push(tie.to_string());
    sql.push_str(" ORDER BY ");
    sql.push_str(&clauses.join(", "));
    Ok(sql)
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    #[instrument(skip(self, record), err)]
    async fn insert(&self, table: &str, record: JsonValue) -> Result<JsonValue, StoreError> {
        let stored = stamp_record(record)?;
        let id = record_id(&stored)?;

        sqlx::query("INSERT INTO records (table_name, id, data) VALUES ($1, $2, $3)")
            .bind(table)
            .bind(id)
            .bind(Json(&stored))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;

        Ok(stored)
    }

    #[instrument(skip(self, records), fields(rows = records.len()), err)]
    async fn insert_many(
        &self,
        table: &str,
        records: Vec<JsonValue>,
    ) -> Result<Vec<JsonValue>, StoreError> {
        let stored = records
            .into_iter()
            .map(stamp_record)
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for row in &stored {
            sqlx::query("INSERT INTO records (table_name, id, data) VALUES ($1, $2, $3)")
                .bind(table)
                .bind(record_id(row)?)
                .bind(Json(row))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("insert_many", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(stored)
    }

    #[instrument(skip(self, query), err)]
    async fn select(&self, table: &str, query: &RowQuery) -> Result<Vec<JsonValue>, StoreError> {
        let sql = select_sql(query)?;
        let filter: serde_json::Map<String, JsonValue> = query.filters.iter().cloned().collect();

        let rows = sqlx::query(&sql)
            .bind(table)
            .bind(Json(JsonValue::Object(filter)))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("select", e))?;

        rows.into_iter()
            .map(|row| {
                row.try_get::<Json<JsonValue>, _>("data")
                    .map(|Json(data)| data)
                    .map_err(|e| map_sqlx_error("select_decode", e))
            })
            .collect()
    }

    #[instrument(skip(self, patch), err)]
    async fn update(
        &self,
        table: &str,
        id: RecordId,
        patch: JsonValue,
    ) -> Result<JsonValue, StoreError> {
        let JsonValue::Object(mut patch) = patch else {
            return Err(StoreError::InvalidRecord("patch must be a JSON object".to_string()));
        };
        patch.remove("id");

        let row = sqlx::query(
            "UPDATE records SET data = data || $3 WHERE table_name = $1 AND id = $2 RETURNING data",
        )
        .bind(table)
        .bind(id.as_uuid())
        .bind(Json(JsonValue::Object(patch)))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        let row = row.ok_or_else(|| StoreError::NotFound {
            table: table.to_string(),
            id,
        })?;
        row.try_get::<Json<JsonValue>, _>("data")
            .map(|Json(data)| data)
            .map_err(|e| map_sqlx_error("update_decode", e))
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::InvalidRecord(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{operation}: {err}"))
        }
        _ => StoreError::Database(format!("sqlx error in {operation}: {err}")),
    }
}
