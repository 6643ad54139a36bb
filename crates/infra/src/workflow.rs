//! Invoice save/send workflow (application-level orchestration).
//!
//! ```text
//! Composing ──save──▶ Persisting ──ok──▶ Persisted ──send──▶ Dispatching ──ack──▶ Sent
//!     ▲                   │                  ▲                    │
//!     └──── error ────────┘                  └────── error ───────┘
//! ```
//!
//! Saving writes the invoice header, then all of its line items in one batch.
//! The two writes are separate store calls with no transaction around them:
//! if the batch fails, the header stays behind without items and the caller
//! gets [`WorkflowError::Persistence`] naming the orphaned header. Nothing is
//! deleted to compensate.
//!
//! Dispatch failures never undo a save. After the dispatch stage acknowledges
//! an invoice, its stored status moves from `draft` to `sent`.

use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::instrument;

use estatenest_core::{DomainError, RecordId};
use estatenest_invoicing::{
    InvoiceDraft, InvoiceItemRecord, InvoiceRecord, InvoiceStatus, NewInvoice, NewInvoiceItem,
    INVOICES_TABLE, INVOICE_ITEMS_TABLE,
};

use crate::dispatch::{DispatchAck, DispatchError, InvoiceDispatch, InvoiceReference};
use crate::store::{
    insert_many_typed, insert_typed, select_typed, update_typed, RecordStore, RowQuery, StoreError,
};

/// Where an invoice session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Composing,
    Persisting,
    Persisted,
    Dispatching,
    Sent,
}

/// Which write failed while persisting an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStage {
    Header,
    Items,
    Status,
}

impl core::fmt::Display for PersistStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            PersistStage::Header => "header",
            PersistStage::Items => "line items",
            PersistStage::Status => "status",
        })
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The draft is not saveable; nothing was written.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A store write failed. `invoice_id` is set when the header row exists.
    #[error("failed to persist invoice {stage}: {source}")]
    Persistence {
        stage: PersistStage,
        invoice_id: Option<RecordId>,
        #[source]
        source: StoreError,
    },

    /// The invoice is saved but could not be delivered.
    #[error("failed to dispatch invoice {invoice_number}: {source}")]
    Dispatch {
        invoice_id: RecordId,
        invoice_number: String,
        #[source]
        source: DispatchError,
    },
}

impl From<DomainError> for WorkflowError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => WorkflowError::Validation(msg),
            other => WorkflowError::Validation(other.to_string()),
        }
    }
}

/// Header and items as stored by one save.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedInvoice {
    pub header: InvoiceRecord,
    pub items: Vec<InvoiceItemRecord>,
}

/// Result of a successful send: the stored header (status `sent`) and the
/// dispatch acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendOutcome {
    pub invoice: InvoiceRecord,
    pub ack: DispatchAck,
}

/// Stateless save/send operations over a record store and a dispatch stage.
#[derive(Debug)]
pub struct InvoiceWorkflow<S, D> {
    store: S,
    dispatch: D,
}

impl<S, D> InvoiceWorkflow<S, D> {
    pub fn new(store: S, dispatch: D) -> Self {
        Self { store, dispatch }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S, D> InvoiceWorkflow<S, D>
where
    S: RecordStore,
    D: InvoiceDispatch,
{
    /// Persist `draft` as a new invoice with status `draft`.
    ///
    /// Totals are snapshotted from the draft as it is now. Every call creates
    /// a new header row.
    #[instrument(
        skip(self, draft),
        fields(invoice_number = %draft.header().invoice_number, items = draft.line_count()),
        err
    )]
    pub async fn save(&self, draft: &InvoiceDraft) -> Result<SavedInvoice, WorkflowError> {
        let header_row = NewInvoice::from_draft(draft)?;

        let header: InvoiceRecord = insert_typed(&self.store, INVOICES_TABLE, &header_row)
            .await
            .map_err(|source| {
                tracing::warn!(error = %source, "invoice header insert failed");
                WorkflowError::Persistence {
                    stage: PersistStage::Header,
                    invoice_id: None,
                    source,
                }
            })?;

        let item_rows = NewInvoiceItem::batch_for(header.id, draft);
        let items: Vec<InvoiceItemRecord> =
            insert_many_typed(&self.store, INVOICE_ITEMS_TABLE, &item_rows)
                .await
                .map_err(|source| {
                    tracing::warn!(
                        invoice_id = %header.id,
                        error = %source,
                        "invoice items insert failed; header row left without items"
                    );
                    WorkflowError::Persistence {
                        stage: PersistStage::Items,
                        invoice_id: Some(header.id),
                        source,
                    }
                })?;

        tracing::info!(
            invoice_id = %header.id,
            total_amount = header.totals().total_amount(),
            "invoice saved as draft"
        );
        Ok(SavedInvoice { header, items })
    }

    /// Hand a stored invoice to the dispatch stage.
    #[instrument(skip(self, header), fields(invoice_id = %header.id), err)]
    pub async fn deliver(
        &self,
        header: &InvoiceRecord,
        recipient_email: &str,
    ) -> Result<DispatchAck, WorkflowError> {
        let reference = InvoiceReference::from(header);
        self.dispatch
            .send(recipient_email, &reference)
            .await
            .map_err(|source| {
                tracing::warn!(error = %source, "invoice dispatch failed; draft kept");
                WorkflowError::Dispatch {
                    invoice_id: header.id,
                    invoice_number: header.invoice.invoice_number.clone(),
                    source,
                }
            })
    }

    /// Flip a stored invoice's status to `sent`.
    pub async fn mark_sent(&self, header: &InvoiceRecord) -> Result<InvoiceRecord, WorkflowError> {
        update_typed(
            &self.store,
            INVOICES_TABLE,
            header.id,
            &json!({ "status": InvoiceStatus::Sent }),
        )
        .await
        .map_err(|source| WorkflowError::Persistence {
            stage: PersistStage::Status,
            invoice_id: Some(header.id),
            source,
        })
    }

    /// Save, dispatch, then mark sent.
    pub async fn send(
        &self,
        draft: &InvoiceDraft,
        recipient_email: &str,
    ) -> Result<SendOutcome, WorkflowError> {
        let saved = self.save(draft).await?;
        self.send_saved(&saved.header, recipient_email).await
    }

    /// Dispatch an already stored invoice, then mark it sent. Nothing is
    /// inserted, so retrying a failed send through here never duplicates
    /// the header.
    pub async fn send_saved(
        &self,
        header: &InvoiceRecord,
        recipient_email: &str,
    ) -> Result<SendOutcome, WorkflowError> {
        let ack = self.deliver(header, recipient_email).await?;
        let invoice = self.mark_sent(header).await?;
        Ok(SendOutcome { invoice, ack })
    }

    /// One stored invoice header.
    pub async fn invoice(&self, invoice_id: RecordId) -> Result<InvoiceRecord, StoreError> {
        let rows: Vec<InvoiceRecord> = select_typed(
            &self.store,
            INVOICES_TABLE,
            &RowQuery::new().filter_eq("id", invoice_id),
        )
        .await?;
        rows.into_iter().next().ok_or_else(|| StoreError::NotFound {
            table: INVOICES_TABLE.to_string(),
            id: invoice_id,
        })
    }

    /// Stored invoice headers, newest first.
    pub async fn list_invoices(&self) -> Result<Vec<InvoiceRecord>, StoreError> {
        select_typed(
            &self.store,
            INVOICES_TABLE,
            &RowQuery::new().order_desc("created_at"),
        )
        .await
    }

    /// Stored line items of one invoice, in the order they were saved.
    pub async fn items_for(&self, invoice_id: RecordId) -> Result<Vec<InvoiceItemRecord>, StoreError> {
        select_typed(
            &self.store,
            INVOICE_ITEMS_TABLE,
            &RowQuery::new().filter_eq("invoice_id", invoice_id),
        )
        .await
    }
}

/// One invoice being edited, saved and sent.
///
/// The session owns the current draft and remembers what has already been
/// stored, so retrying a failed send re-uses the saved header instead of
/// inserting another one. Any edit starts over from `Composing`.
#[derive(Debug, Clone)]
pub struct InvoiceSession {
    draft: InvoiceDraft,
    state: WorkflowState,
    send_requested: bool,
    saved: Option<InvoiceRecord>,
    ack: Option<DispatchAck>,
}

impl InvoiceSession {
    pub fn new(draft: InvoiceDraft) -> Self {
        Self {
            draft,
            state: WorkflowState::Composing,
            send_requested: false,
            saved: None,
            ack: None,
        }
    }

    pub fn draft(&self) -> &InvoiceDraft {
        &self.draft
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn send_requested(&self) -> bool {
        self.send_requested
    }

    /// Header stored by the last successful save, if the draft has not changed since.
    pub fn saved(&self) -> Option<&InvoiceRecord> {
        self.saved.as_ref()
    }

    /// Replace the draft with `f(draft)`.
    pub fn edit(&mut self, f: impl FnOnce(InvoiceDraft) -> InvoiceDraft) {
        self.draft = f(self.draft.clone());
        self.state = WorkflowState::Composing;
        self.send_requested = false;
        self.saved = None;
        self.ack = None;
    }

    /// Save the current draft as a new invoice.
    pub async fn save<S, D>(
        &mut self,
        workflow: &InvoiceWorkflow<S, D>,
    ) -> Result<SavedInvoice, WorkflowError>
    where
        S: RecordStore,
        D: InvoiceDispatch,
    {
        self.state = WorkflowState::Persisting;
        match workflow.save(&self.draft).await {
            Ok(saved) => {
                self.state = WorkflowState::Persisted;
                self.saved = Some(saved.header.clone());
                self.ack = None;
                Ok(saved)
            }
            Err(err) => {
                self.state = WorkflowState::Composing;
                Err(err)
            }
        }
    }

    /// Save (unless already saved), dispatch, then mark the invoice sent.
    ///
    /// A dispatch failure leaves the session `Persisted`; calling `send`
    /// again re-dispatches the same stored invoice. If only the status
    /// update failed, a retry skips dispatch and retries the update.
    pub async fn send<S, D>(
        &mut self,
        workflow: &InvoiceWorkflow<S, D>,
        recipient_email: &str,
    ) -> Result<SendOutcome, WorkflowError>
    where
        S: RecordStore,
        D: InvoiceDispatch,
    {
        self.send_requested = true;

        let header = match self.saved.clone() {
            Some(header) => header,
            None => self.save(workflow).await?.header,
        };

        let ack = match self.ack.clone() {
            Some(ack) => ack,
            None => {
                self.state = WorkflowState::Dispatching;
                match workflow.deliver(&header, recipient_email).await {
                    Ok(ack) => {
                        self.ack = Some(ack.clone());
                        ack
                    }
                    Err(err) => {
                        self.state = WorkflowState::Persisted;
                        return Err(err);
                    }
                }
            }
        };

        match workflow.mark_sent(&header).await {
            Ok(invoice) => {
                self.state = WorkflowState::Sent;
                self.saved = Some(invoice.clone());
                self.ack = None;
                Ok(SendOutcome { invoice, ack })
            }
            Err(err) => {
                self.state = WorkflowState::Persisted;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use estatenest_invoicing::{DraftHeader, HeaderEdit, LineItem, LineItemPatch};

    use crate::dispatch::RecordingDispatch;
    use crate::store::InMemoryRecordStore;

    type TestWorkflow = InvoiceWorkflow<Arc<InMemoryRecordStore>, Arc<RecordingDispatch>>;

    fn setup() -> (TestWorkflow, Arc<InMemoryRecordStore>, Arc<RecordingDispatch>) {
        let store = Arc::new(InMemoryRecordStore::new());
        let dispatch = Arc::new(RecordingDispatch::new());
        (InvoiceWorkflow::new(store.clone(), dispatch.clone()), store, dispatch)
    }

    fn test_draft(client_name: &str) -> InvoiceDraft {
        let header = DraftHeader::opened_on(
            "INV-1709251200000",
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            14,
        );
        InvoiceDraft::from_parts(
            header,
            vec![LineItem::new("Excavation", 2.0, 100.0), LineItem::new("Permit", 1.0, 50.0)],
        )
        .update_header(HeaderEdit::ClientName(client_name.to_string()))
        .update_header(HeaderEdit::ClientEmail("billing@acme.ca".to_string()))
    }

    #[tokio::test]
    async fn save_writes_header_then_items() {
        let (workflow, store, _) = setup();
        let saved = workflow.save(&test_draft("Acme Homes")).await.unwrap();

        assert_eq!(saved.header.status(), InvoiceStatus::Draft);
        assert_eq!(saved.header.totals().subtotal(), 250.0);
        assert_eq!(saved.header.totals().gst_amount(), 12.5);
        assert_eq!(saved.header.totals().total_amount(), 262.5);

        assert_eq!(saved.items.len(), 2);
        assert!(saved.items.iter().all(|i| i.item.invoice_id == saved.header.id));
        assert_eq!(saved.items[0].item.line_total, 200.0);

        assert_eq!(store.rows(INVOICES_TABLE).len(), 1);
        assert_eq!(store.rows(INVOICE_ITEMS_TABLE).len(), 2);
        assert_eq!(workflow.items_for(saved.header.id).await.unwrap(), saved.items);
    }

    #[tokio::test]
    async fn missing_client_name_never_touches_store() {
        let (workflow, store, _) = setup();
        let mut session = InvoiceSession::new(test_draft(""));

        let err = session.save(&workflow).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        assert_eq!(store.write_calls(), 0);
        assert_eq!(session.state(), WorkflowState::Composing);
    }

    #[tokio::test]
    async fn header_failure_writes_nothing() {
        let (workflow, store, _) = setup();
        store.fail_writes_to(INVOICES_TABLE);
        let mut session = InvoiceSession::new(test_draft("Acme Homes"));
        let before = session.draft().clone();

        let err = session.save(&workflow).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Persistence { stage: PersistStage::Header, invoice_id: None, .. }
        ));
        assert!(store.rows(INVOICE_ITEMS_TABLE).is_empty());
        assert_eq!(session.draft(), &before);
        assert_eq!(session.state(), WorkflowState::Composing);
    }

    #[tokio::test]
    async fn item_failure_leaves_orphaned_header() {
        let (workflow, store, _) = setup();
        store.fail_writes_to(INVOICE_ITEMS_TABLE);
        let mut session = InvoiceSession::new(test_draft("Acme Homes"));
        let before = session.draft().clone();

        let err = session.save(&workflow).await.unwrap_err();
        let orphan = match err {
            WorkflowError::Persistence { stage: PersistStage::Items, invoice_id: Some(id), .. } => id,
            other => panic!("expected items persistence error, got {other:?}"),
        };

        let headers = store.rows(INVOICES_TABLE);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0]["id"], json!(orphan));
        assert!(store.rows(INVOICE_ITEMS_TABLE).is_empty());

        assert_eq!(session.draft(), &before);
        assert_eq!(session.state(), WorkflowState::Composing);
        session.edit(|d| d.update_line_item(0, LineItemPatch::Quantity(3.0)));
        assert_eq!(session.draft().line_items()[0].quantity, 3.0);
    }

    #[tokio::test]
    async fn saved_totals_do_not_follow_later_edits() {
        let (workflow, store, _) = setup();
        let mut session = InvoiceSession::new(test_draft("Acme Homes"));
        session.save(&workflow).await.unwrap();

        session.edit(|d| d.add_line_item().update_line_item(2, LineItemPatch::UnitPrice(1000.0)));
        assert_eq!(session.draft().subtotal(), 1250.0);
        assert!(session.saved().is_none());

        let stored = workflow.list_invoices().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].totals().subtotal(), 250.0);
        assert_eq!(store.rows(INVOICE_ITEMS_TABLE).len(), 2);
    }

    #[tokio::test]
    async fn saving_twice_creates_two_headers() {
        let (workflow, store, _) = setup();
        let mut session = InvoiceSession::new(test_draft("Acme Homes"));
        let first = session.save(&workflow).await.unwrap();
        let second = session.save(&workflow).await.unwrap();

        assert_ne!(first.header.id, second.header.id);
        assert_eq!(store.rows(INVOICES_TABLE).len(), 2);
        assert_eq!(store.rows(INVOICE_ITEMS_TABLE).len(), 4);
    }

    #[tokio::test]
    async fn send_dispatches_and_marks_sent() {
        let (workflow, store, dispatch) = setup();
        let mut session = InvoiceSession::new(test_draft("Acme Homes"));

        let outcome = session.send(&workflow, "billing@acme.ca").await.unwrap();
        assert_eq!(outcome.invoice.status(), InvoiceStatus::Sent);
        assert_eq!(outcome.ack.invoice_number, "INV-1709251200000");
        assert_eq!(session.state(), WorkflowState::Sent);
        assert!(session.send_requested());

        let sent = dispatch.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "billing@acme.ca");
        assert_eq!(sent[0].1.invoice_number, "INV-1709251200000");
        assert_eq!(sent[0].1.total_amount, 262.5);

        let headers = store.rows(INVOICES_TABLE);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0]["status"], "sent");
    }

    #[tokio::test]
    async fn dispatch_failure_keeps_draft_and_retry_reuses_header() {
        let (workflow, store, dispatch) = setup();
        dispatch.fail_with(DispatchError::Unavailable("smtp down".into()));
        let mut session = InvoiceSession::new(test_draft("Acme Homes"));

        let err = session.send(&workflow, "billing@acme.ca").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Dispatch { .. }));
        assert_eq!(session.state(), WorkflowState::Persisted);

        let headers = store.rows(INVOICES_TABLE);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0]["status"], "draft");

        dispatch.succeed();
        let outcome = session.send(&workflow, "billing@acme.ca").await.unwrap();
        assert_eq!(outcome.invoice.status(), InvoiceStatus::Sent);
        assert_eq!(dispatch.sent().len(), 2);
        assert_eq!(store.rows(INVOICES_TABLE).len(), 1);
        assert_eq!(store.rows(INVOICE_ITEMS_TABLE).len(), 2);
    }

    #[tokio::test]
    async fn status_update_failure_retries_without_redispatch() {
        let (workflow, store, dispatch) = setup();
        let mut session = InvoiceSession::new(test_draft("Acme Homes"));
        session.save(&workflow).await.unwrap();

        store.fail_writes_to(INVOICES_TABLE);
        let err = session.send(&workflow, "billing@acme.ca").await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Persistence { stage: PersistStage::Status, invoice_id: Some(_), .. }
        ));
        assert_eq!(session.state(), WorkflowState::Persisted);
        assert_eq!(dispatch.sent().len(), 1);

        store.restore_writes_to(INVOICES_TABLE);
        session.send(&workflow, "billing@acme.ca").await.unwrap();
        assert_eq!(dispatch.sent().len(), 1);
        assert_eq!(store.rows(INVOICES_TABLE)[0]["status"], "sent");
    }

    #[tokio::test]
    async fn send_without_client_name_is_rejected_before_io() {
        let (workflow, store, dispatch) = setup();
        let mut session = InvoiceSession::new(test_draft("  "));

        let err = session.send(&workflow, "billing@acme.ca").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        assert_eq!(store.write_calls(), 0);
        assert!(dispatch.sent().is_empty());
    }

    #[tokio::test]
    async fn stateless_send_runs_all_steps() {
        let (workflow, store, dispatch) = setup();
        let outcome = workflow.send(&test_draft("Acme Homes"), "billing@acme.ca").await.unwrap();

        assert_eq!(outcome.invoice.status(), InvoiceStatus::Sent);
        assert_eq!(dispatch.sent().len(), 1);
        assert_eq!(store.rows(INVOICES_TABLE).len(), 1);
    }

    #[tokio::test]
    async fn failed_send_retried_by_id_keeps_one_header() {
        let (workflow, store, dispatch) = setup();
        dispatch.fail_with(DispatchError::Unavailable("relay down".into()));

        let err = workflow
            .send(&test_draft("Acme Homes"), "billing@acme.ca")
            .await
            .unwrap_err();
        let WorkflowError::Dispatch { invoice_id, .. } = err else {
            panic!("expected dispatch error, got {err:?}");
        };

        dispatch.succeed();
        let header = workflow.invoice(invoice_id).await.unwrap();
        let outcome = workflow.send_saved(&header, "billing@acme.ca").await.unwrap();

        assert_eq!(outcome.invoice.id, invoice_id);
        assert_eq!(outcome.invoice.status(), InvoiceStatus::Sent);
        assert_eq!(store.rows(INVOICES_TABLE).len(), 1);
        assert_eq!(store.rows(INVOICE_ITEMS_TABLE).len(), 2);
        assert_eq!(dispatch.sent().len(), 2);
    }

    #[tokio::test]
    async fn unknown_invoice_is_not_found() {
        let (workflow, _, _) = setup();
        let err = workflow.invoice(RecordId::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
