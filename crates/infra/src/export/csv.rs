//! CSV rendering with every data field quoted.
//!
//! The header row is written plain. Each data field is wrapped in double
//! quotes with embedded quotes doubled; rows end in `\n` and the trailing
//! newline is dropped.

use ::csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;

use estatenest_costs::CostItem;
use estatenest_invoicing::InvoiceRecord;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("csv output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// A record type that can be written as one CSV row.
pub trait CsvRecord {
    /// Column titles, in output order.
    fn headers() -> &'static [&'static str];

    /// Field values, in the same order as [`CsvRecord::headers`].
    fn fields(&self) -> Vec<String>;
}

fn writer(style: QuoteStyle, buf: Vec<u8>) -> ::csv::Writer<Vec<u8>> {
    WriterBuilder::new()
        .quote_style(style)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buf)
}

fn finish(w: ::csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    w.into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))
}

pub fn to_csv<T: CsvRecord>(records: &[T]) -> Result<String, ExportError> {
    let mut header = writer(QuoteStyle::Necessary, Vec::new());
    header.write_record(T::headers())?;

    let mut rows = writer(QuoteStyle::Always, finish(header)?);
    for record in records {
        rows.write_record(record.fields())?;
    }

    let mut out = String::from_utf8(finish(rows)?)?;
    if out.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}

impl CsvRecord for CostItem {
    fn headers() -> &'static [&'static str] {
        &[
            "Cost Item",
            "Vendor Name",
            "Contact",
            "Email",
            "Phone",
            "Cost (CAD)",
            "Year",
            "Comments",
        ]
    }

    fn fields(&self) -> Vec<String> {
        let c = &self.cost;
        vec![
            c.cost_item.clone(),
            c.vendor_name.clone(),
            c.vendor_contact.clone(),
            c.vendor_email.clone(),
            c.vendor_phone.clone(),
            c.cost_amount.to_string(),
            c.year.to_string(),
            c.comments.clone(),
        ]
    }
}

impl CsvRecord for InvoiceRecord {
    fn headers() -> &'static [&'static str] {
        &[
            "Invoice Number",
            "Invoice Date",
            "Due Date",
            "Client",
            "Company",
            "Status",
            "Subtotal (CAD)",
            "GST (CAD)",
            "Total (CAD)",
        ]
    }

    fn fields(&self) -> Vec<String> {
        let i = &self.invoice;
        vec![
            i.invoice_number.clone(),
            i.invoice_date.to_string(),
            i.due_date.to_string(),
            i.client_name.clone(),
            i.client_company.clone(),
            i.status.as_str().to_string(),
            format!("{:.2}", i.totals.subtotal()),
            format!("{:.2}", i.totals.gst_amount()),
            format!("{:.2}", i.totals.total_amount()),
        ]
    }
}
