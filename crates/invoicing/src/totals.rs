use serde::{Deserialize, Serialize};

use crate::line_item::LineItem;

/// Goods and Services Tax rate applied to every invoice subtotal.
pub const GST_RATE: f64 = 0.05;

/// Subtotal, GST and total computed together from one set of line items.
///
/// The fields are only set through [`InvoiceTotals::from_line_items`] and
/// [`InvoiceTotals::from_subtotal`], so `total == subtotal + gst` holds for
/// every value built in-process. Deserialized values are stored snapshots and
/// are taken as-is, never recomputed.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    subtotal: f64,
    gst_amount: f64,
    total_amount: f64,
}

impl InvoiceTotals {
    pub fn from_line_items(items: &[LineItem]) -> Self {
        Self::from_subtotal(items.iter().map(LineItem::line_total).sum())
    }

    pub fn from_subtotal(subtotal: f64) -> Self {
        let gst_amount = subtotal * GST_RATE;
        Self {
            subtotal,
            gst_amount,
            total_amount: subtotal + gst_amount,
        }
    }

    pub fn subtotal(&self) -> f64 {
        self.subtotal
    }

    pub fn gst_amount(&self) -> f64 {
        self.gst_amount
    }

    pub fn total_amount(&self) -> f64 {
        self.total_amount
    }
}
