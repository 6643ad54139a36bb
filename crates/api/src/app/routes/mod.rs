use axum::{
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

pub mod costs;
pub mod invoices;
pub mod projects;
pub mod system;

/// Router for every data endpoint.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/invoices", invoices::router())
        .nest("/costs", costs::router())
        .nest("/projects", projects::router())
}

/// `body` served as a CSV download named `file_name`.
pub(crate) fn csv_attachment(file_name: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response()
}
