//! Dispatch stage: delivery of a saved invoice to its recipient.
//!
//! Delivery is an external concern (e-mail provider, edge function, ...).
//! This module only defines the boundary plus two implementations: a logging
//! stub used by the service until a real transport exists, and a recording
//! double for tests.

pub mod logging;
pub mod recording;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use estatenest_core::RecordId;
use estatenest_invoicing::InvoiceRecord;

pub use logging::LoggingDispatch;
pub use recording::RecordingDispatch;

/// What the dispatch stage needs to know about a saved invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceReference {
    pub invoice_id: RecordId,
    pub invoice_number: String,
    pub client_name: String,
    pub total_amount: f64,
}

impl From<&InvoiceRecord> for InvoiceReference {
    fn from(record: &InvoiceRecord) -> Self {
        Self {
            invoice_id: record.id,
            invoice_number: record.invoice.invoice_number.clone(),
            client_name: record.invoice.client_name.clone(),
            total_amount: record.invoice.totals.total_amount(),
        }
    }
}

/// Acknowledgement returned by a transport that accepted the invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchAck {
    pub recipient: String,
    pub invoice_number: String,
    pub dispatched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The transport refused the request (e.g. malformed recipient address).
    #[error("dispatch rejected: {0}")]
    Rejected(String),

    /// The transport could not be reached or failed while sending.
    #[error("dispatch unavailable: {0}")]
    Unavailable(String),
}

/// Delivers invoices to recipients.
#[async_trait]
pub trait InvoiceDispatch: Send + Sync {
    async fn send(
        &self,
        recipient_email: &str,
        invoice: &InvoiceReference,
    ) -> Result<DispatchAck, DispatchError>;
}

#[async_trait]
impl<D> InvoiceDispatch for Arc<D>
where
    D: InvoiceDispatch + ?Sized,
{
    async fn send(
        &self,
        recipient_email: &str,
        invoice: &InvoiceReference,
    ) -> Result<DispatchAck, DispatchError> {
        (**self).send(recipient_email, invoice).await
    }
}

/// Minimal address check shared by the transports: `local@domain` with a
/// dot in the domain and no whitespace.
pub fn check_recipient(recipient_email: &str) -> Result<(), DispatchError> {
    let email = recipient_email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DispatchError::Rejected(format!(
            "invalid recipient address: {recipient_email:?}"
        )))
    }
}
