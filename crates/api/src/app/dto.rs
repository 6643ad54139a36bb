use serde::{Deserialize, Serialize};

use estatenest_invoicing::{DraftHeader, InvoiceDraft, InvoiceTotals, LineItem};

// -------------------------
// Request DTOs
// -------------------------

/// Draft as submitted by the composer form.
#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub header: DraftHeader,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl DraftRequest {
    pub fn into_draft(self) -> InvoiceDraft {
        InvoiceDraft::from_parts(self.header, self.line_items)
    }
}

#[derive(Debug, Deserialize)]
pub struct SendInvoiceRequest {
    pub recipient_email: String,
    #[serde(flatten)]
    pub draft: DraftRequest,
}

/// Retry delivery of an invoice that is already stored.
#[derive(Debug, Deserialize)]
pub struct SendStoredInvoiceRequest {
    pub recipient_email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CostsQuery {
    pub year: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

/// A draft together with its computed totals.
#[derive(Debug, Serialize)]
pub struct DraftView {
    #[serde(flatten)]
    pub draft: InvoiceDraft,
    pub totals: InvoiceTotals,
}

impl From<InvoiceDraft> for DraftView {
    fn from(draft: InvoiceDraft) -> Self {
        Self {
            totals: draft.totals(),
            draft,
        }
    }
}
