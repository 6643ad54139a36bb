use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{DispatchAck, DispatchError, InvoiceDispatch, InvoiceReference};

/// Test double that records every send and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingDispatch {
    sent: Mutex<Vec<(String, InvoiceReference)>>,
    failure: Mutex<Option<DispatchError>>,
}

impl RecordingDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every subsequent send with `err` until [`RecordingDispatch::succeed`].
    pub fn fail_with(&self, err: DispatchError) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(err);
        }
    }

    pub fn succeed(&self) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = None;
        }
    }

    /// Every attempted send (failed ones included), oldest first.
    pub fn sent(&self) -> Vec<(String, InvoiceReference)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl InvoiceDispatch for RecordingDispatch {
    async fn send(
        &self,
        recipient_email: &str,
        invoice: &InvoiceReference,
    ) -> Result<DispatchAck, DispatchError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((recipient_email.to_string(), invoice.clone()));
        }

        let failure = self
            .failure
            .lock()
            .map_err(|_| DispatchError::Unavailable("lock poisoned".to_string()))?
            .clone();
        if let Some(err) = failure {
            return Err(err);
        }

        Ok(DispatchAck {
            recipient: recipient_email.to_string(),
            invoice_number: invoice.invoice_number.clone(),
            dispatched_at: Utc::now(),
        })
    }
}
