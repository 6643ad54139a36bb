use serde::Serialize;
use serde_json::Value as JsonValue;

/// Sort direction for one ordering column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

/// Row selection: equality conditions (all must hold) plus ordering.
///
/// An empty query selects every row of the table in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowQuery {
    pub filters: Vec<(String, JsonValue)>,
    pub order: Vec<OrderBy>,
}

impl RowQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep rows whose `column` equals `value`.
    ///
    /// Values that fail to serialize are compared as JSON `null`.
    pub fn filter_eq(mut self, column: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(JsonValue::Null);
        self.filters.push((column.into(), value));
        self
    }

    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order.push(OrderBy {
            column: column.into(),
            direction: Direction::Ascending,
        });
        self
    }

    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order.push(OrderBy {
            column: column.into(),
            direction: Direction::Descending,
        });
        self
    }

    /// True when `row` satisfies every equality condition.
    pub fn matches(&self, row: &JsonValue) -> bool {
        self.filters
            .iter()
            .all(|(column, expected)| row.get(column) == Some(expected))
    }
}
