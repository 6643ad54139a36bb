use chrono::{DateTime, Utc};

/// Default prefix for client-generated invoice numbers.
pub const DEFAULT_INVOICE_PREFIX: &str = "INV-";

/// `<prefix><unix millis>`, e.g. `INV-1709251200000`.
///
/// Uniqueness is only as good as the clock; the store does not enforce it.
pub fn generate_invoice_number(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{prefix}{}", now.timestamp_millis())
}
