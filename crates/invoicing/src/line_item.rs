use serde::{Deserialize, Serialize};

/// One billable row of an invoice draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl Default for LineItem {
    fn default() -> Self {
        Self {
            description: String::new(),
            quantity: 1.0,
            unit_price: 0.0,
        }
    }
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    /// `quantity × unit_price`; negative values propagate.
    pub fn line_total(&self) -> f64 {
        self.quantity * self.unit_price
    }

    /// Return a copy of this item with a single field replaced.
    pub fn patched(mut self, patch: LineItemPatch) -> Self {
        match patch {
            LineItemPatch::Description(description) => self.description = description,
            LineItemPatch::Quantity(quantity) => self.quantity = quantity,
            LineItemPatch::UnitPrice(unit_price) => self.unit_price = unit_price,
        }
        self
    }
}

/// Replacement for one field of a [`LineItem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum LineItemPatch {
    Description(String),
    Quantity(f64),
    UnitPrice(f64),
}
