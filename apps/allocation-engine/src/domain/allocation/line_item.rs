//! Purchase-order line items as seen by the allocation engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::CatalogId;

/// Keywords marking a line as a service charge rather than physical stock.
pub const DEFAULT_SERVICE_KEYWORDS: [&str; 5] =
    ["shipping", "delivery", "freight", "postage", "transport"];

/// Receipt status of a line as reported by the PO lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    /// Nothing received yet.
    #[default]
    NotReceipted,
    /// Some, but not all, of the ordered quantity received.
    PartiallyReceipted,
    /// Received quantity covers the ordered quantity.
    FullyReceipted,
}

impl ReceiptStatus {
    /// Derive the status from ordered and received quantities. A line with
    /// nothing ordered counts as fully receipted.
    #[must_use]
    pub const fn from_quantities(ordered: u32, received: u32) -> Self {
        if received >= ordered {
            Self::FullyReceipted
        } else if received > 0 {
            Self::PartiallyReceipted
        } else {
            Self::NotReceipted
        }
    }

    /// Get the wire name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotReceipted => "not_receipted",
            Self::PartiallyReceipted => "partially_receipted",
            Self::FullyReceipted => "fully_receipted",
        }
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quantity to allocate after repairing malformed upstream input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedQuantity {
    /// Quantity to place (always at least 1).
    pub value: u32,
    /// True when the caller's quantity was non-positive and had to be replaced.
    pub repaired: bool,
}

/// A single PO line the caller wants placed into a storage device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalog id of the line.
    pub catalog_id: CatalogId,
    /// Supplier part number.
    pub part_no: String,
    /// Line description.
    pub description: String,
    /// Quantity on the order.
    pub quantity_ordered: u32,
    /// Quantity already receipted.
    pub quantity_received: u32,
    /// Quantity the caller asked to allocate; may be zero or negative upstream.
    pub quantity_requested: i64,
    /// Receipt status the caller observed for the line.
    pub receipt_status: ReceiptStatus,
}

impl LineItem {
    /// Create a line item with the given catalog id and requested quantity.
    #[must_use]
    pub fn new(catalog_id: CatalogId, quantity_requested: i64) -> Self {
        Self {
            catalog_id,
            part_no: String::new(),
            description: String::new(),
            quantity_ordered: 0,
            quantity_received: 0,
            quantity_requested,
            receipt_status: ReceiptStatus::NotReceipted,
        }
    }

    /// Set the part number and description.
    #[must_use]
    pub fn with_part(mut self, part_no: impl Into<String>, description: impl Into<String>) -> Self {
        self.part_no = part_no.into();
        self.description = description.into();
        self
    }

    /// Set the ordered quantity.
    #[must_use]
    pub const fn with_quantity_ordered(mut self, quantity_ordered: u32) -> Self {
        self.quantity_ordered = quantity_ordered;
        self
    }

    /// Set the caller-observed receipt status.
    #[must_use]
    pub const fn with_receipt_status(mut self, receipt_status: ReceiptStatus) -> Self {
        self.receipt_status = receipt_status;
        self
    }

    /// Repaired quantity: a non-positive request falls back to the ordered
    /// quantity, and to 1 when that is zero too.
    #[must_use]
    pub fn requested_quantity(&self) -> RequestedQuantity {
        if self.quantity_requested > 0 {
            return RequestedQuantity {
                value: u32::try_from(self.quantity_requested).unwrap_or(u32::MAX),
                repaired: false,
            };
        }
        RequestedQuantity {
            value: self.quantity_ordered.max(1),
            repaired: true,
        }
    }

    /// Check whether the line is a service charge (no physical stock).
    ///
    /// Case-insensitive substring match of each keyword against the part
    /// number and the description.
    #[must_use]
    pub fn is_service_line<S: AsRef<str>>(&self, keywords: &[S]) -> bool {
        let part_no = self.part_no.to_lowercase();
        let description = self.description.to_lowercase();
        keywords.iter().any(|keyword| {
            let keyword = keyword.as_ref().to_lowercase();
            !keyword.is_empty() && (part_no.contains(&keyword) || description.contains(&keyword))
        })
    }
}
