use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use estatenest_core::{format_cad, RecordId};

pub const PROJECTS_TABLE: &str = "projects";

const NOT_AVAILABLE: &str = "N/A";

/// Project status lifecycle.
///
/// Unknown stored values read back as `Archived`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ProjectStatus {
    Active,
    Completed,
    Archived,
}

impl From<String> for ProjectStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "active" => ProjectStatus::Active,
            "completed" => ProjectStatus::Completed,
            _ => ProjectStatus::Archived,
        }
    }
}

impl ProjectStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "Active",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Archived => "Archived",
        }
    }
}

/// Persisted project row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    pub project_name: String,
    #[serde(default)]
    pub project_address: Option<String>,
    #[serde(default)]
    pub buyer_name: Option<String>,
    #[serde(default)]
    pub buyer_email: Option<String>,
    #[serde(default)]
    pub buyer_phone: Option<String>,
    #[serde(default)]
    pub realtor_name: Option<String>,
    #[serde(default)]
    pub realtor_email: Option<String>,
    #[serde(default)]
    pub closed_price: Option<f64>,
    #[serde(default)]
    pub project_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub project_finish_date: Option<NaiveDate>,
    #[serde(default)]
    pub warranty_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub warranty_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub wcb_policy: Option<String>,
    #[serde(default)]
    pub insurance_policy: Option<String>,
    pub status: ProjectStatus,
}

/// Display-ready view of a project; blanks become `N/A`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub id: RecordId,
    pub project_name: String,
    pub project_address: String,
    pub status: ProjectStatus,
    pub status_label: &'static str,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub realtor_name: String,
    pub realtor_email: String,
    pub closed_price: String,
    pub project_start: String,
    pub project_finish: String,
    pub warranty_start: String,
    pub warranty_end: String,
    pub wcb_policy: String,
    pub insurance_policy: String,
}

fn text_or_na(value: &Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn date_or_na(value: Option<NaiveDate>) -> String {
    value
        .map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

impl Project {
    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            project_name: self.project_name.clone(),
            project_address: text_or_na(&self.project_address),
            status: self.status,
            status_label: self.status.label(),
            buyer_name: text_or_na(&self.buyer_name),
            buyer_email: text_or_na(&self.buyer_email),
            buyer_phone: text_or_na(&self.buyer_phone),
            realtor_name: text_or_na(&self.realtor_name),
            realtor_email: text_or_na(&self.realtor_email),
            closed_price: self
                .closed_price
                .map(format_cad)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            project_start: date_or_na(self.project_start_date),
            project_finish: date_or_na(self.project_finish_date),
            warranty_start: date_or_na(self.warranty_start_date),
            warranty_end: date_or_na(self.warranty_end_date),
            wcb_policy: text_or_na(&self.wcb_policy),
            insurance_policy: text_or_na(&self.insurance_policy),
        }
    }
}
