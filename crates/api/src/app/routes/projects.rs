use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};

use estatenest_infra::store::{select_typed, RowQuery};
use estatenest_projects::{Project, ProjectSummary, PROJECTS_TABLE};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/", get(list_projects))
}

/// Projects newest first, formatted for display.
pub async fn list_projects(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let projects: Vec<Project> = match select_typed(
        services.store.as_ref(),
        PROJECTS_TABLE,
        &RowQuery::new().order_desc("created_at"),
    )
    .await
    {
        Ok(rows) => rows,
        Err(e) => return errors::store_error_to_response(e),
    };

    let summaries: Vec<ProjectSummary> = projects.iter().map(Project::summary).collect();
    Json(summaries).into_response()
}
