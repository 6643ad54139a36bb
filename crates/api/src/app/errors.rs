use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use estatenest_core::DomainError;
use estatenest_infra::export::ExportError;
use estatenest_infra::{StoreError, WorkflowError};

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Workflow failures. Persistence and dispatch errors carry the stored
/// `invoice_id` when a header row exists, so the client can retry with
/// `POST /invoices/:id/send` instead of saving again.
pub fn workflow_error_to_response(err: WorkflowError) -> axum::response::Response {
    let (status, code, invoice_id) = match &err {
        WorkflowError::Validation(msg) => {
            return json_error(StatusCode::BAD_REQUEST, "validation_error", msg.clone());
        }
        WorkflowError::Persistence { invoice_id, .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "persistence_error", *invoice_id)
        }
        WorkflowError::Dispatch { invoice_id, .. } => {
            (StatusCode::BAD_GATEWAY, "dispatch_error", Some(*invoice_id))
        }
    };
    tracing::warn!(error = %err, "invoice workflow failed");

    (
        status,
        axum::Json(json!({
            "error": code,
            "message": err.to_string(),
            "invoice_id": invoice_id,
        })),
    )
        .into_response()
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    tracing::warn!(error = %err, "store request failed");
    match err {
        StoreError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        StoreError::Unavailable(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg)
        }
        other => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            other.to_string(),
        ),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

pub fn export_error_to_response(err: ExportError) -> axum::response::Response {
    tracing::warn!(error = %err, "csv export failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "export_error", err.to_string())
}
