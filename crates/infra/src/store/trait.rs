use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

use estatenest_core::RecordId;

use super::query::RowQuery;

/// Record store operation error.
///
/// These are **infrastructure errors** (availability, malformed rows,
/// database failures) as opposed to domain errors (validation, invariants).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("record {id} not found in {table}")]
    NotFound { table: String, id: RecordId },

    #[error("record (de)serialization failed: {0}")]
    Serialization(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Table-oriented record store (the persistence adapter).
///
/// Rows are JSON objects. On insert the store assigns `id` (UUIDv7) and
/// `created_at` (RFC 3339, UTC) and returns the stored row.
///
/// ## Atomicity
///
/// Each call is atomic on its own: `insert_many` stores every row or none.
/// There is **no** transaction spanning several calls, so a caller that
/// writes a parent row and then its children can end up with a parent and no
/// children if the second call fails.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, table: &str, record: JsonValue) -> Result<JsonValue, StoreError>;

    async fn insert_many(
        &self,
        table: &str,
        records: Vec<JsonValue>,
    ) -> Result<Vec<JsonValue>, StoreError>;

    async fn select(&self, table: &str, query: &RowQuery) -> Result<Vec<JsonValue>, StoreError>;

    /// Merge the keys of `patch` into the row with `id`; returns the updated row.
    async fn update(
        &self,
        table: &str,
        id: RecordId,
        patch: JsonValue,
    ) -> Result<JsonValue, StoreError>;
}

#[async_trait]
impl<S> RecordStore for Arc<S>
where
    S: RecordStore + ?Sized,
{
    async fn insert(&self, table: &str, record: JsonValue) -> Result<JsonValue, StoreError> {
        (**self).insert(table, record).await
    }

    async fn insert_many(
        &self,
        table: &str,
        records: Vec<JsonValue>,
    ) -> Result<Vec<JsonValue>, StoreError> {
        (**self).insert_many(table, records).await
    }

    async fn select(&self, table: &str, query: &RowQuery) -> Result<Vec<JsonValue>, StoreError> {
        (**self).select(table, query).await
    }

    async fn update(
        &self,
        table: &str,
        id: RecordId,
        patch: JsonValue,
    ) -> Result<JsonValue, StoreError> {
        (**self).update(table, id, patch).await
    }
}
