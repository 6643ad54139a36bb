//! Persistence adapter: table-oriented record storage.
//!
//! Domain crates describe row shapes with serde; this module stores them as
//! JSON objects behind the [`RecordStore`] trait, with an in-memory backend
//! for tests/dev and a Postgres backend for deployments.

pub mod in_memory;
pub mod postgres;
pub mod query;
pub mod r#trait;
pub mod typed;

pub use in_memory::InMemoryRecordStore;
pub use postgres::PostgresRecordStore;
pub use query::{Direction, OrderBy, RowQuery};
pub use r#trait::{RecordStore, StoreError};
pub use typed::{insert_many_typed, insert_typed, select_typed, update_typed};

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value as JsonValue};

use estatenest_core::RecordId;

/// Assign `id` and `created_at` to a new row unless the caller set them.
pub(crate) fn stamp_record(record: JsonValue) -> Result<JsonValue, StoreError> {
    let JsonValue::Object(mut map) = record else {
        return Err(StoreError::InvalidRecord("record must be a JSON object".to_string()));
    };
    map.entry("id").or_insert_with(|| json!(RecordId::new()));
    map.entry("created_at")
        .or_insert_with(|| json!(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)));
    Ok(JsonValue::Object(map))
}
