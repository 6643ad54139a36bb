//! Invoicing domain module.
//!
//! This crate contains the invoice draft composer, GST totals and the row
//! shapes persisted for invoices, implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod draft;
pub mod line_item;
pub mod number;
pub mod record;
pub mod totals;

pub use draft::{ClientContact, DraftHeader, HeaderEdit, InvoiceDraft, DEFAULT_PAYMENT_TERMS_DAYS};
pub use estatenest_core::parse_amount;
pub use line_item::{LineItem, LineItemPatch};
pub use number::{generate_invoice_number, DEFAULT_INVOICE_PREFIX};
pub use record::{
    InvoiceItemRecord, InvoiceRecord, InvoiceStatus, NewInvoice, NewInvoiceItem, INVOICES_TABLE,
    INVOICE_ITEMS_TABLE,
};
pub use totals::{InvoiceTotals, GST_RATE};
