//! Editable invoice draft.
//!
//! The draft is a plain value. Every edit consumes the current draft and
//! returns the next one, so callers hold exactly one version at a time and
//! can keep an earlier copy around to restore after a failed save.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::line_item::{LineItem, LineItemPatch};
use crate::totals::InvoiceTotals;

/// Terms printed on a new draft for the default 14-day payment window.
pub const DEFAULT_PAYMENT_TERMS_DAYS: u64 = 14;

/// Bill-to contact. Only `name` is required at save time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContact {
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Header fields of an invoice draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftHeader {
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub terms: String,
    pub client: ClientContact,
    #[serde(default)]
    pub notes: String,
}

impl DraftHeader {
    /// Header defaults for a draft opened on `today`: due `terms_days` later,
    /// terms `"Net <days>"`, blank client.
    pub fn opened_on(invoice_number: impl Into<String>, today: NaiveDate, terms_days: u64) -> Self {
        let due_date = today.checked_add_days(Days::new(terms_days)).unwrap_or(today);
        Self {
            invoice_number: invoice_number.into(),
            invoice_date: today,
            due_date,
            terms: format!("Net {terms_days}"),
            client: ClientContact::default(),
            notes: String::new(),
        }
    }

    /// Returns true when a client name is present (whitespace does not count).
    pub fn has_client_name(&self) -> bool {
        !self.client.name.trim().is_empty()
    }
}

/// Replacement for one header field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum HeaderEdit {
    InvoiceNumber(String),
    InvoiceDate(NaiveDate),
    DueDate(NaiveDate),
    Terms(String),
    ClientName(String),
    ClientCompany(String),
    ClientAddress(String),
    ClientEmail(String),
    ClientPhone(String),
    Notes(String),
}

/// Invoice header plus an ordered, never-empty list of line items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceDraft {
    header: DraftHeader,
    line_items: Vec<LineItem>,
}

impl InvoiceDraft {
    /// A fresh draft with a single empty line item.
    pub fn new(header: DraftHeader) -> Self {
        Self {
            header,
            line_items: vec![LineItem::default()],
        }
    }

    /// Rebuild a draft from its parts (e.g. a draft submitted by a client).
    ///
    /// An empty item list is replaced by one default row.
    pub fn from_parts(header: DraftHeader, line_items: Vec<LineItem>) -> Self {
        if line_items.is_empty() {
            return Self::new(header);
        }
        Self { header, line_items }
    }

    pub fn header(&self) -> &DraftHeader {
        &self.header
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn line_count(&self) -> usize {
        self.line_items.len()
    }

    pub fn add_line_item(mut self) -> Self {
        self.line_items.push(LineItem::default());
        self
    }

    /// Remove the item at `index`.
    ///
    /// No-op when it is the last remaining row or `index` is out of range.
    pub fn remove_line_item(mut self, index: usize) -> Self {
        if self.line_items.len() > 1 && index < self.line_items.len() {
            self.line_items.remove(index);
        }
        self
    }

    /// Replace one field of the item at `index`; out-of-range is a no-op.
    pub fn update_line_item(mut self, index: usize, patch: LineItemPatch) -> Self {
        if let Some(slot) = self.line_items.get_mut(index) {
            let current = std::mem::take(slot);
            *slot = current.patched(patch);
        }
        self
    }

    pub fn update_header(mut self, edit: HeaderEdit) -> Self {
        let h = &mut self.header;
        match edit {
            HeaderEdit::InvoiceNumber(v) => h.invoice_number = v,
            HeaderEdit::InvoiceDate(v) => h.invoice_date = v,
            HeaderEdit::DueDate(v) => h.due_date = v,
            HeaderEdit::Terms(v) => h.terms = v,
            HeaderEdit::ClientName(v) => h.client.name = v,
            HeaderEdit::ClientCompany(v) => h.client.company = v,
            HeaderEdit::ClientAddress(v) => h.client.address = v,
            HeaderEdit::ClientEmail(v) => h.client.email = v,
            HeaderEdit::ClientPhone(v) => h.client.phone = v,
            HeaderEdit::Notes(v) => h.notes = v,
        }
        self
    }

    pub fn subtotal(&self) -> f64 {
        self.totals().subtotal()
    }

    pub fn tax(&self) -> f64 {
        self.totals().gst_amount()
    }

    pub fn total(&self) -> f64 {
        self.totals().total_amount()
    }

    pub fn totals(&self) -> InvoiceTotals {
        InvoiceTotals::from_line_items(&self.line_items)
    }
}
