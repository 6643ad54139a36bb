use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{Datelike, Utc};

use estatenest_costs::{CostItem, CostItemForm, CostReport, YearFilter, CONSTRUCTION_COSTS_TABLE};
use estatenest_infra::export::to_csv;
use estatenest_infra::store::{insert_typed, select_typed, RowQuery, StoreError};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_costs).post(create_cost))
        .route("/new", get(blank_form))
        .route("/export.csv", get(export_costs))
}

async fn load_all(services: &AppServices) -> Result<Vec<CostItem>, StoreError> {
    select_typed(
        services.store.as_ref(),
        CONSTRUCTION_COSTS_TABLE,
        &RowQuery::new().order_desc("created_at"),
    )
    .await
}

async fn build_report(
    services: &AppServices,
    query: dto::CostsQuery,
) -> Result<CostReport, axum::response::Response> {
    let filter: YearFilter = query
        .year
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(errors::domain_error_to_response)?;
    let all = load_all(services)
        .await
        .map_err(errors::store_error_to_response)?;
    Ok(CostReport::build(&all, filter))
}

pub async fn list_costs(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::CostsQuery>,
) -> axum::response::Response {
    match build_report(&services, query).await {
        Ok(report) => Json(report).into_response(),
        Err(resp) => resp,
    }
}

/// Empty entry form defaulted to the current year.
pub async fn blank_form() -> impl IntoResponse {
    Json(CostItemForm::for_year(Utc::now().year()))
}

pub async fn create_cost(
    Extension(services): Extension<Arc<AppServices>>,
    Json(form): Json<CostItemForm>,
) -> axum::response::Response {
    let row = match form.validate() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let stored: Result<CostItem, _> =
        insert_typed(services.store.as_ref(), CONSTRUCTION_COSTS_TABLE, &row).await;
    match stored {
        Ok(item) => {
            tracing::info!(cost_id = %item.id, year = item.cost.year, "cost item recorded");
            (StatusCode::CREATED, Json(item)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn export_costs(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::CostsQuery>,
) -> axum::response::Response {
    let report = match build_report(&services, query).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match to_csv(&report.items) {
        Ok(body) => super::csv_attachment(&report.csv_file_name(), body),
        Err(e) => errors::export_error_to_response(e),
    }
}
