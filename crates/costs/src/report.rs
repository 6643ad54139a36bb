use core::str::FromStr;

use serde::Serialize;

use estatenest_core::DomainError;

use crate::cost_item::CostItem;

/// Year selector for the cost listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum YearFilter {
    #[default]
    All,
    Year(i32),
}

impl YearFilter {
    pub fn matches(&self, item: &CostItem) -> bool {
        match self {
            YearFilter::All => true,
            YearFilter::Year(year) => item.cost.year == *year,
        }
    }
}

impl core::fmt::Display for YearFilter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            YearFilter::All => f.write_str("all"),
            YearFilter::Year(year) => write!(f, "{year}"),
        }
    }
}

impl FromStr for YearFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") || s.is_empty() {
            return Ok(YearFilter::All);
        }
        s.parse::<i32>()
            .map(YearFilter::Year)
            .map_err(|_| DomainError::validation(format!("invalid year filter: {s:?}")))
    }
}

/// Items matching `filter`, in input order.
pub fn filter_by_year(items: &[CostItem], filter: YearFilter) -> Vec<CostItem> {
    items.iter().filter(|c| filter.matches(c)).cloned().collect()
}

/// Distinct years present in `items`, newest first.
pub fn distinct_years(items: &[CostItem]) -> Vec<i32> {
    let mut years: Vec<i32> = items.iter().map(|c| c.cost.year).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

pub fn total_cost(items: &[CostItem]) -> f64 {
    items.iter().map(|c| c.cost.cost_amount).sum()
}

/// Cost listing for one year selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostReport {
    pub filter: String,
    pub years: Vec<i32>,
    pub items: Vec<CostItem>,
    pub total: f64,
}

impl CostReport {
    /// `years` always lists every year in `all_items`, not just the filtered ones.
    pub fn build(all_items: &[CostItem], filter: YearFilter) -> Self {
        let items = filter_by_year(all_items, filter);
        Self {
            filter: filter.to_string(),
            years: distinct_years(all_items),
            total: total_cost(&items),
            items,
        }
    }

    /// Download name for this selection, e.g. `construction-costs-2024.csv`.
    pub fn csv_file_name(&self) -> String {
        format!("construction-costs-{}.csv", self.filter)
    }
}
