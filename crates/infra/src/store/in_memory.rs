use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use estatenest_core::RecordId;

use super::query::{Direction, RowQuery};
use super::stamp_record;
use super::r#trait::{RecordStore, StoreError};

/// In-memory record store.
///
/// Intended for tests/dev. Writes to selected tables can be made to fail so
/// callers can exercise their failure paths, and every write call is counted.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<HashMap<String, Vec<JsonValue>>>,
    failing_tables: RwLock<HashSet<String>>,
    write_calls: AtomicUsize,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write to `table` fail with `Unavailable`.
    pub fn fail_writes_to(&self, table: &str) {
        if let Ok(mut failing) = self.failing_tables.write() {
            failing.insert(table.to_string());
        }
    }

    pub fn restore_writes_to(&self, table: &str) {
        if let Ok(mut failing) = self.failing_tables.write() {
            failing.remove(table);
        }
    }

    /// Number of `insert` / `insert_many` / `update` calls seen, failed ones included.
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(AtomicOrdering::SeqCst)
    }

    /// Snapshot of a table in insertion order.
    pub fn rows(&self, table: &str) -> Vec<JsonValue> {
        self.tables
            .read()
            .ok()
            .and_then(|tables| tables.get(table).cloned())
            .unwrap_or_default()
    }

    fn begin_write(&self, table: &str) -> Result<(), StoreError> {
        self.write_calls.fetch_add(1, AtomicOrdering::SeqCst);
        let failing = self
            .failing_tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        if failing.contains(table) {
            return Err(StoreError::Unavailable(format!("writes to {table} are failing")));
        }
        Ok(())
    }
}

fn type_rank(value: Option<&JsonValue>) -> u8 {
    match value {
        None | Some(JsonValue::Null) => 0,
        Some(JsonValue::Bool(_)) => 1,
        Some(JsonValue::Number(_)) => 2,
        Some(JsonValue::String(_)) => 3,
        Some(_) => 4,
    }
}

/// Total order over column values: null < bool < number < string < other.
fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(JsonValue::Bool(x)), Some(JsonValue::Bool(y))) => x.cmp(y),
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, table: &str, record: JsonValue) -> Result<JsonValue, StoreError> {
        self.begin_write(table)?;
        let stored = stamp_record(record)?;

        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        tables.entry(table.to_string()).or_default().push(stored.clone());
        Ok(stored)
    }

    async fn insert_many(
        &self,
        table: &str,
        records: Vec<JsonValue>,
    ) -> Result<Vec<JsonValue>, StoreError> {
        self.begin_write(table)?;

        // Stamp everything first so a bad row leaves the table untouched.
        let stored = records
            .into_iter()
            .map(stamp_record)
            .collect::<Result<Vec<_>, _>>()?;

        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        tables
            .entry(table.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn select(&self, table: &str, query: &RowQuery) -> Result<Vec<JsonValue>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        let Some(rows) = tables.get(table) else {
            return Ok(vec![]);
        };

        let mut matched: Vec<(usize, &JsonValue)> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| query.matches(row))
            .collect();

        // Ties fall back to insertion order, following the last sort direction.
        let tie_direction = query
            .order
            .last()
            .map(|o| o.direction)
            .unwrap_or(Direction::Ascending);

        matched.sort_by(|(ia, a), (ib, b)| {
            for order in &query.order {
                let ord = compare_values(a.get(&order.column), b.get(&order.column));
                let ord = match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            match tie_direction {
                Direction::Ascending => ia.cmp(ib),
                Direction::Descending => ib.cmp(ia),
            }
        });

        Ok(matched.into_iter().map(|(_, row)| row.clone()).collect())
    }

    async fn update(
        &self,
        table: &str,
        id: RecordId,
        patch: JsonValue,
    ) -> Result<JsonValue, StoreError> {
        self.begin_write(table)?;
        let JsonValue::Object(patch) = patch else {
            return Err(StoreError::InvalidRecord("patch must be a JSON object".to_string()));
        };

        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        let id_value = json!(id);
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| r.get("id") == Some(&id_value)))
            .ok_or_else(|| StoreError::NotFound {
                table: table.to_string(),
                id,
            })?;

        if let JsonValue::Object(fields) = row {
            for (key, value) in patch {
                if key != "id" {
                    fields.insert(key, value);
                }
            }
        }
        Ok(row.clone())
    }
}
