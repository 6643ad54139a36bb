use async_trait::async_trait;
use chrono::Utc;

use super::{check_recipient, DispatchAck, DispatchError, InvoiceDispatch, InvoiceReference};

/// Dispatch stub: validates the recipient, logs the request and acknowledges.
///
/// No message leaves the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDispatch;

impl LoggingDispatch {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl InvoiceDispatch for LoggingDispatch {
    async fn send(
        &self,
        recipient_email: &str,
        invoice: &InvoiceReference,
    ) -> Result<DispatchAck, DispatchError> {
        check_recipient(recipient_email)?;

        tracing::info!(
            recipient = recipient_email.trim(),
            invoice_id = %invoice.invoice_id,
            invoice_number = %invoice.invoice_number,
            total_amount = invoice.total_amount,
            "invoice dispatch requested (no transport configured)"
        );

        Ok(DispatchAck {
            recipient: recipient_email.trim().to_string(),
            invoice_number: invoice.invoice_number.clone(),
            dispatched_at: Utc::now(),
        })
    }
}
