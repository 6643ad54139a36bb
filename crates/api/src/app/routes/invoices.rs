use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use estatenest_core::RecordId;
use estatenest_infra::export::to_csv;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(save_invoice).get(list_invoices))
        .route("/new", get(new_draft))
        .route("/send", post(send_invoice))
        .route("/export.csv", get(export_invoices))
        .route("/:id/items", get(invoice_items))
        .route("/:id/send", post(send_stored_invoice))
}

/// Blank draft numbered and dated now.
pub async fn new_draft(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(dto::DraftView::from(services.config.open_draft(Utc::now())))
}

pub async fn save_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::DraftRequest>,
) -> axum::response::Response {
    let draft = body.into_draft();
    match services.workflow.save(&draft).await {
        Ok(saved) => (StatusCode::CREATED, Json(saved)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn send_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SendInvoiceRequest>,
) -> axum::response::Response {
    let draft = body.draft.into_draft();
    match services.workflow.send(&draft, &body.recipient_email).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

/// Dispatch an invoice that was saved earlier (e.g. after a failed send).
pub async fn send_stored_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::SendStoredInvoiceRequest>,
) -> axum::response::Response {
    let invoice_id: RecordId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let header = match services.workflow.invoice(invoice_id).await {
        Ok(h) => h,
        Err(e) => return errors::store_error_to_response(e),
    };

    match services.workflow.send_saved(&header, &body.recipient_email).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.workflow.list_invoices().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn invoice_items(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let invoice_id: RecordId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.workflow.items_for(invoice_id).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn export_invoices(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.workflow.list_invoices().await {
        Ok(rows) => match to_csv(&rows) {
            Ok(body) => super::csv_attachment("invoices.csv", body),
            Err(e) => errors::export_error_to_response(e),
        },
        Err(e) => errors::store_error_to_response(e),
    }
}
