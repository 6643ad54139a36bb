//! Row shapes written to and read from the `invoices` and `invoice_items`
//! tables.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use estatenest_core::{DomainError, DomainResult, RecordId};

use crate::draft::InvoiceDraft;
use crate::line_item::LineItem;
use crate::totals::InvoiceTotals;

pub const INVOICES_TABLE: &str = "invoices";
pub const INVOICE_ITEMS_TABLE: &str = "invoice_items";

/// Invoice status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
        }
    }
}

/// Invoice header row as inserted (the store assigns `id` and `created_at`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub terms: String,
    pub client_name: String,
    pub client_company: String,
    pub client_address: String,
    pub client_email: String,
    pub client_phone: String,
    pub notes: String,
    #[serde(flatten)]
    pub totals: InvoiceTotals,
    pub status: InvoiceStatus,
}

impl NewInvoice {
    /// Snapshot a draft into a header row with status `draft`.
    ///
    /// Fails when the client name is blank.
    pub fn from_draft(draft: &InvoiceDraft) -> DomainResult<Self> {
        let header = draft.header();
        if !header.has_client_name() {
            return Err(DomainError::required("client name"));
        }

        Ok(Self {
            invoice_number: header.invoice_number.clone(),
            invoice_date: header.invoice_date,
            due_date: header.due_date,
            terms: header.terms.clone(),
            client_name: header.client.name.clone(),
            client_company: header.client.company.clone(),
            client_address: header.client.address.clone(),
            client_email: header.client.email.clone(),
            client_phone: header.client.phone.clone(),
            notes: header.notes.clone(),
            totals: draft.totals(),
            status: InvoiceStatus::Draft,
        })
    }
}

/// Persisted invoice header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub invoice: NewInvoice,
}

impl InvoiceRecord {
    pub fn invoice_number(&self) -> &str {
        &self.invoice.invoice_number
    }

    pub fn status(&self) -> InvoiceStatus {
        self.invoice.status
    }

    pub fn totals(&self) -> InvoiceTotals {
        self.invoice.totals
    }
}

/// Line item row as inserted, stamped with its parent invoice id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoiceItem {
    pub invoice_id: RecordId,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub line_total: f64,
}

impl NewInvoiceItem {
    pub fn for_invoice(invoice_id: RecordId, item: &LineItem) -> Self {
        Self {
            invoice_id,
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.line_total(),
        }
    }

    /// One row per draft item, in draft order.
    pub fn batch_for(invoice_id: RecordId, draft: &InvoiceDraft) -> Vec<Self> {
        draft
            .line_items()
            .iter()
            .map(|item| Self::for_invoice(invoice_id, item))
            .collect()
    }
}

/// Persisted line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItemRecord {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub item: NewInvoiceItem,
}
