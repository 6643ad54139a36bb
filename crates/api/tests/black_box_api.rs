use std::sync::Arc;

use estatenest_api::app::{self, services::AppServices};
use estatenest_infra::{
    AppConfig, DispatchError, InMemoryRecordStore, RecordStore, RecordingDispatch,
};
use estatenest_invoicing::{INVOICES_TABLE, INVOICE_ITEMS_TABLE};
use estatenest_projects::PROJECTS_TABLE;
use reqwest::StatusCode;
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    store: Arc<InMemoryRecordStore>,
    dispatch: Arc<RecordingDispatch>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory store, recording dispatch, ephemeral port.
        let store = Arc::new(InMemoryRecordStore::new());
        let dispatch = Arc::new(RecordingDispatch::new());
        let services = Arc::new(AppServices::new(
            AppConfig::default(),
            store.clone(),
            dispatch.clone(),
        ));
        let app = app::build_app(services);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            dispatch,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn draft_body(client_name: &str) -> Value {
    json!({
        "header": {
            "invoice_number": "INV-1709251200000",
            "invoice_date": "2024-03-01",
            "due_date": "2024-03-15",
            "terms": "Net 14",
            "client": { "name": client_name, "email": "buyer@example.com" },
            "notes": "Lot 14 upgrades"
        },
        "line_items": [
            { "description": "Deck", "quantity": 2.0, "unit_price": 100.0 },
            { "description": "Railing", "quantity": 1.0, "unit_price": 50.0 }
        ]
    })
}

fn approx(value: &Value, expected: f64) -> bool {
    (value.as_f64().unwrap() - expected).abs() < 1e-9
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn new_draft_has_number_terms_and_one_row() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/invoices/new")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert!(body["header"]["invoice_number"].as_str().unwrap().starts_with("INV-"));
    assert_eq!(body["header"]["terms"], "Net 14");
    assert_eq!(body["line_items"].as_array().unwrap().len(), 1);
    assert!(approx(&body["totals"]["total_amount"], 0.0));
}

#[tokio::test]
async fn save_persists_header_and_items() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/invoices"))
        .json(&draft_body("Jane Buyer"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let saved: Value = res.json().await.unwrap();

    let header = &saved["header"];
    assert_eq!(header["status"], "draft");
    assert_eq!(header["client_name"], "Jane Buyer");
    assert!(approx(&header["subtotal"], 250.0));
    assert!(approx(&header["gst_amount"], 12.5));
    assert!(approx(&header["total_amount"], 262.5));
    assert_eq!(saved["items"].as_array().unwrap().len(), 2);

    let id = header["id"].as_str().unwrap();
    let items: Value = client
        .get(srv.url(&format!("/invoices/{id}/items")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i["invoice_id"] == header["id"]));
    assert!(approx(&items[0]["line_total"], 200.0));

    let listed: Value = client
        .get(srv.url("/invoices"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn save_without_client_name_writes_nothing() {
    let srv = TestServer::spawn().await;

    let res = reqwest::Client::new()
        .post(srv.url("/invoices"))
        .json(&draft_body("   "))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    assert_eq!(srv.store.write_calls(), 0);
    assert!(srv.dispatch.sent().is_empty());
}

#[tokio::test]
async fn failed_item_batch_leaves_orphan_header() {
    let srv = TestServer::spawn().await;
    srv.store.fail_writes_to(INVOICE_ITEMS_TABLE);

    let res = reqwest::Client::new()
        .post(srv.url("/invoices"))
        .json(&draft_body("Jane Buyer"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "persistence_error");

    assert_eq!(srv.store.rows(INVOICES_TABLE).len(), 1);
    assert!(srv.store.rows(INVOICE_ITEMS_TABLE).is_empty());
}

#[tokio::test]
async fn send_dispatches_and_marks_sent() {
    let srv = TestServer::spawn().await;
    let mut body = draft_body("Jane Buyer");
    body["recipient_email"] = json!("buyer@example.com");

    let res = reqwest::Client::new()
        .post(srv.url("/invoices/send"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let outcome: Value = res.json().await.unwrap();
    assert_eq!(outcome["invoice"]["status"], "sent");
    assert_eq!(outcome["ack"]["recipient"], "buyer@example.com");

    let sent = srv.dispatch.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "buyer@example.com");
    assert_eq!(sent[0].1.invoice_number, "INV-1709251200000");

    let rows = srv.store.rows(INVOICES_TABLE);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "sent");
}

#[tokio::test]
async fn dispatch_failure_keeps_saved_draft() {
    let srv = TestServer::spawn().await;
    srv.dispatch
        .fail_with(DispatchError::Unavailable("mail relay down".into()));

    let mut body = draft_body("Jane Buyer");
    body["recipient_email"] = json!("buyer@example.com");

    let res = reqwest::Client::new()
        .post(srv.url("/invoices/send"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "dispatch_error");

    let rows = srv.store.rows(INVOICES_TABLE);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "draft");
    assert_eq!(srv.store.rows(INVOICE_ITEMS_TABLE).len(), 2);
}

#[tokio::test]
async fn retry_after_failed_send_reuses_stored_invoice() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.dispatch
        .fail_with(DispatchError::Unavailable("mail relay down".into()));

    let mut body = draft_body("Jane Buyer");
    body["recipient_email"] = json!("buyer@example.com");

    let res = client
        .post(srv.url("/invoices/send"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let err: Value = res.json().await.unwrap();
    let invoice_id = err["invoice_id"].as_str().unwrap().to_string();

    srv.dispatch.succeed();
    let res = client
        .post(srv.url(&format!("/invoices/{invoice_id}/send")))
        .json(&json!({ "recipient_email": "buyer@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let outcome: Value = res.json().await.unwrap();
    assert_eq!(outcome["invoice"]["id"], invoice_id.as_str());
    assert_eq!(outcome["invoice"]["status"], "sent");

    let rows = srv.store.rows(INVOICES_TABLE);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "sent");
    assert_eq!(srv.store.rows(INVOICE_ITEMS_TABLE).len(), 2);
    assert_eq!(srv.dispatch.sent().len(), 2);
}

#[tokio::test]
async fn send_by_unknown_id_is_not_found() {
    let srv = TestServer::spawn().await;

    let res = reqwest::Client::new()
        .post(srv.url(&format!("/invoices/{}/send", estatenest_core::RecordId::new())))
        .json(&json!({ "recipient_email": "buyer@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(srv.dispatch.sent().is_empty());
}

#[tokio::test]
async fn costs_filter_by_year_and_export_csv() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for (item, amount, year) in [("Framing", "12000", "2023"), ("Roof \"A\"", "8500.5", "2024")] {
        let res = client
            .post(srv.url("/costs"))
            .json(&json!({
                "cost_item": item,
                "vendor_name": "Prairie Lumber",
                "cost_amount": amount,
                "year": year
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let report: Value = client
        .get(srv.url("/costs?year=2024"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["filter"], "2024");
    assert_eq!(report["items"].as_array().unwrap().len(), 1);
    assert_eq!(report["years"], json!([2024, 2023]));
    assert!(approx(&report["total"], 8500.5));

    let all: Value = client
        .get(srv.url("/costs"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all["filter"], "all");
    assert!(approx(&all["total"], 20500.5));

    let res = client
        .get(srv.url("/costs/export.csv?year=2024"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let disposition = res
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("construction-costs-2024.csv"));

    let csv = res.text().await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "Cost Item,Vendor Name,Contact,Email,Phone,Cost (CAD),Year,Comments"
    );
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("\"Roof \"\"A\"\"\",\"Prairie Lumber\""));
}

#[tokio::test]
async fn cost_form_requires_item_vendor_and_amount() {
    let srv = TestServer::spawn().await;

    let res = reqwest::Client::new()
        .post(srv.url("/costs"))
        .json(&json!({ "cost_item": "Framing", "year": "2024" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(srv.store.write_calls(), 0);
}

#[tokio::test]
async fn projects_listed_newest_first_with_labels() {
    let srv = TestServer::spawn().await;
    srv.store
        .insert(
            PROJECTS_TABLE,
            json!({
                "created_at": "2023-05-01T00:00:00Z",
                "project_name": "Maple Ridge Lot 3",
                "status": "completed",
                "closed_price": 689000.0
            }),
        )
        .await
        .unwrap();
    srv.store
        .insert(
            PROJECTS_TABLE,
            json!({
                "created_at": "2024-02-01T00:00:00Z",
                "project_name": "Aspen Court",
                "status": "on-hold"
            }),
        )
        .await
        .unwrap();

    let body: Value = reqwest::get(srv.url("/projects"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let projects = body.as_array().unwrap();
    assert_eq!(projects.len(), 2);

    assert_eq!(projects[0]["project_name"], "Aspen Court");
    assert_eq!(projects[0]["status_label"], "Archived");
    assert_eq!(projects[0]["closed_price"], "N/A");

    assert_eq!(projects[1]["status_label"], "Completed");
    assert_eq!(projects[1]["closed_price"], "CA$689,000.00");
}
