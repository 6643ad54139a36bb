use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estatenest_core::{parse_amount, DomainError, DomainResult, RecordId};

pub const CONSTRUCTION_COSTS_TABLE: &str = "construction_costs";

/// Cost item row as inserted (the store assigns `id` and `created_at`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCostItem {
    pub cost_item: String,
    pub vendor_name: String,
    #[serde(default)]
    pub vendor_contact: String,
    #[serde(default)]
    pub vendor_email: String,
    #[serde(default)]
    pub vendor_phone: String,
    /// Amount in CAD.
    pub cost_amount: f64,
    pub year: i32,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub project_id: Option<RecordId>,
}

/// Persisted cost item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostItem {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub cost: NewCostItem,
}

/// Cost item as typed into the entry form; every field is raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostItemForm {
    pub cost_item: String,
    pub vendor_name: String,
    pub vendor_contact: String,
    pub vendor_email: String,
    pub vendor_phone: String,
    pub cost_amount: String,
    pub year: String,
    pub comments: String,
    pub project_id: Option<RecordId>,
}

impl CostItemForm {
    /// A blank form defaulting to `current_year`.
    pub fn for_year(current_year: i32) -> Self {
        Self {
            year: current_year.to_string(),
            ..Self::default()
        }
    }

    /// Check required fields and parse numbers.
    ///
    /// Cost item, vendor name and amount must be filled in. The amount is
    /// parsed leniently (garbage becomes 0); the year must be an integer.
    pub fn validate(&self) -> DomainResult<NewCostItem> {
        if self.cost_item.trim().is_empty()
            || self.vendor_name.trim().is_empty()
            || self.cost_amount.trim().is_empty()
        {
            return Err(DomainError::validation(
                "cost item, vendor name and cost amount are required",
            ));
        }

        let year: i32 = self
            .year
            .trim()
            .parse()
            .map_err(|_| DomainError::validation(format!("invalid year: {:?}", self.year)))?;

        Ok(NewCostItem {
            cost_item: self.cost_item.clone(),
            vendor_name: self.vendor_name.clone(),
            vendor_contact: self.vendor_contact.clone(),
            vendor_email: self.vendor_email.clone(),
            vendor_phone: self.vendor_phone.clone(),
            cost_amount: parse_amount(&self.cost_amount),
            year,
            comments: self.comments.clone(),
            project_id: self.project_id,
        })
    }
}
