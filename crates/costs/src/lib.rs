//! Construction cost tracking (pure domain, no IO).
//!
//! Cost items are recorded against a year, filtered per year for review and
//! summed into a running total.

pub mod cost_item;
pub mod report;

pub use cost_item::{CostItem, CostItemForm, NewCostItem, CONSTRUCTION_COSTS_TABLE};
pub use report::{distinct_years, filter_by_year, total_cost, CostReport, YearFilter};
