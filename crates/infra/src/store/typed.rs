//! Typed helpers over [`RecordStore`]: serialize rows going in, deserialize
//! rows coming out.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use estatenest_core::RecordId;

use super::query::RowQuery;
use super::r#trait::{RecordStore, StoreError};

fn to_row<T: Serialize>(row: &T) -> Result<JsonValue, StoreError> {
    serde_json::to_value(row)
        .map_err(|e| StoreError::Serialization(format!("row serialization failed: {e}")))
}

fn from_row<R: DeserializeOwned>(table: &str, row: JsonValue) -> Result<R, StoreError> {
    serde_json::from_value(row)
        .map_err(|e| StoreError::Serialization(format!("malformed row in {table}: {e}")))
}

pub async fn insert_typed<S, T, R>(store: &S, table: &str, row: &T) -> Result<R, StoreError>
where
    S: RecordStore + ?Sized,
    T: Serialize + Sync,
    R: DeserializeOwned,
{
    let stored = store.insert(table, to_row(row)?).await?;
    from_row(table, stored)
}

pub async fn insert_many_typed<S, T, R>(
    store: &S,
    table: &str,
    rows: &[T],
) -> Result<Vec<R>, StoreError>
where
    S: RecordStore + ?Sized,
    T: Serialize + Sync,
    R: DeserializeOwned,
{
    let rows = rows.iter().map(to_row).collect::<Result<Vec<_>, _>>()?;
    let stored = store.insert_many(table, rows).await?;
    stored.into_iter().map(|r| from_row(table, r)).collect()
}

pub async fn select_typed<S, R>(store: &S, table: &str, query: &RowQuery) -> Result<Vec<R>, StoreError>
where
    S: RecordStore + ?Sized,
    R: DeserializeOwned,
{
    let rows = store.select(table, query).await?;
    rows.into_iter().map(|r| from_row(table, r)).collect()
}

pub async fn update_typed<S, T, R>(
    store: &S,
    table: &str,
    id: RecordId,
    patch: &T,
) -> Result<R, StoreError>
where
    S: RecordStore + ?Sized,
    T: Serialize + Sync,
    R: DeserializeOwned,
{
    let stored = store.update(table, id, to_row(patch)?).await?;
    from_row(table, stored)
}
