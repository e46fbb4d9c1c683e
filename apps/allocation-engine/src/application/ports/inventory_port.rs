//! Inventory Port (Driven Port)
//!
//! Typed surface of the remote ERP that the allocation engine reads from and
//! writes to. Every method is a single logical remote call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::allocation::CurrentAllocation;
use crate::domain::shared::{CatalogId, PoId, ReceiptId, StorageDeviceId};

/// Detail of one receipt of a purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReceiptDetail {
    /// Receipt id.
    pub receipt_id: ReceiptId,
    /// Items-received flag. `None` when the ERP omitted it.
    pub items_received: Option<bool>,
    /// Catalog lines on the receipt.
    pub catalogs: Vec<ReceiptCatalog>,
}

/// A catalog line on a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptCatalog {
    /// Catalog id.
    pub catalog_id: CatalogId,
    /// Where the receipted stock was allocated, when recorded.
    pub allocation: Option<CurrentAllocation>,
}

/// One storage allocation of an order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAllocation {
    /// Storage device.
    pub storage_device_id: StorageDeviceId,
    /// Quantity allocated there.
    pub quantity: u32,
}

/// A stock line held in a storage device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    /// Stock record id, when the ERP exposes one.
    pub stock_id: Option<u64>,
    /// Catalog id.
    pub catalog_id: CatalogId,
    /// Supplier part number.
    pub part_no: String,
    /// Item description.
    pub description: String,
    /// Quantity on hand.
    pub quantity: u32,
    /// Job the stock is reserved for.
    pub job_id: Option<u64>,
    /// Name of that job.
    pub job_name: Option<String>,
}

/// One catalog moved by a stock transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLine {
    /// Catalog id.
    pub catalog_id: CatalogId,
    /// Quantity to move.
    pub quantity: u32,
}

/// Stock transfer between two storage devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTransferRequest {
    /// Device to take stock from.
    pub from: StorageDeviceId,
    /// Device to put stock into.
    pub to: StorageDeviceId,
    /// Catalogs to move.
    pub lines: Vec<TransferLine>,
}

impl StockTransferRequest {
    /// Create a transfer.
    #[must_use]
    pub const fn new(from: StorageDeviceId, to: StorageDeviceId, lines: Vec<TransferLine>) -> Self {
        Self { from, to, lines }
    }
}

/// Purchase order header returned by a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PurchaseOrderSummary {
    /// ERP id.
    pub po_id: PoId,
    /// Vendor company name.
    pub vendor_name: Option<String>,
    /// Job the order is raised against.
    pub job_id: Option<u64>,
    /// Order stage.
    pub stage: Option<String>,
}

/// Job header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobSummary {
    /// Job id.
    pub job_id: u64,
    /// Job name.
    pub name: Option<String>,
    /// Customer company name.
    pub customer_name: Option<String>,
}

/// An order line as listed on the purchase order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrderLine {
    /// Catalog id.
    pub catalog_id: CatalogId,
    /// Supplier part number.
    pub part_no: String,
    /// Description.
    pub description: String,
    /// Quantity ordered.
    pub quantity_ordered: u32,
    /// Quantity receipted so far.
    pub quantity_received: u32,
}

/// Inventory port error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Token exchange failed.
    #[error("Authentication failed: {message}")]
    Auth {
        /// Error details.
        message: String,
    },

    /// Network failure after the retry.
    #[error("Transport error calling {endpoint}: {message}")]
    Transport {
        /// Remote path.
        endpoint: String,
        /// Error details.
        message: String,
    },

    /// The ERP answered with a non-success status.
    #[error("HTTP {status} from {endpoint}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Remote path.
        endpoint: String,
        /// JSON body sent, if any.
        request_payload: Option<String>,
        /// Body received.
        response_body: String,
    },

    /// The ERP answered with a body that could not be read.
    #[error("Unexpected response from {endpoint}: {message}")]
    Decode {
        /// Remote path.
        endpoint: String,
        /// Error details.
        message: String,
    },
}

impl RemoteError {
    /// Remote path the error came from, when known.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Auth { .. } => None,
            Self::Transport { endpoint, .. }
            | Self::Rejected { endpoint, .. }
            | Self::Decode { endpoint, .. } => Some(endpoint),
        }
    }

    /// HTTP status, for rejections.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Request payload, for rejections.
    #[must_use]
    pub fn request_payload(&self) -> Option<&str> {
        match self {
            Self::Rejected {
                request_payload, ..
            } => request_payload.as_deref(),
            _ => None,
        }
    }

    /// Response body, for rejections.
    #[must_use]
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Rejected { response_body, .. } => Some(response_body),
            _ => None,
        }
    }

    /// True for failures that make any further remote call pointless.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::Transport { .. })
    }

    /// Short machine-readable kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::Transport { .. } => "transport",
            Self::Rejected { .. } => "remote_rejection",
            Self::Decode { .. } => "decode",
        }
    }
}

/// Port for the remote inventory system.
#[async_trait]
pub trait InventoryPort: Send + Sync {
    /// List the receipts of a purchase order.
    async fn list_receipts(&self, po_id: PoId) -> Result<Vec<ReceiptId>, RemoteError>;

    /// Get a receipt's flag and catalog lines.
    async fn get_receipt(
        &self,
        po_id: PoId,
        receipt_id: ReceiptId,
    ) -> Result<ReceiptDetail, RemoteError>;

    /// Set a receipt's items-received flag.
    async fn mark_items_received(
        &self,
        po_id: PoId,
        receipt_id: ReceiptId,
    ) -> Result<(), RemoteError>;

    /// Get the storage allocations of an order line.
    async fn get_allocations(
        &self,
        po_id: PoId,
        catalog_id: CatalogId,
    ) -> Result<Vec<StockAllocation>, RemoteError>;

    /// Replace the storage allocations of an order line with a single one.
    async fn set_allocation(
        &self,
        po_id: PoId,
        catalog_id: CatalogId,
        allocation: StockAllocation,
    ) -> Result<(), RemoteError>;

    /// Get the stock held in a storage device.
    async fn get_storage_stock(
        &self,
        storage_device_id: StorageDeviceId,
    ) -> Result<Vec<StockLine>, RemoteError>;

    /// Move stock between storage devices.
    async fn transfer_stock(&self, request: &StockTransferRequest) -> Result<(), RemoteError>;

    /// Set the status of a purchase order.
    async fn set_order_status(&self, po_id: PoId, status_id: u64) -> Result<(), RemoteError>;

    /// Find a purchase order by its number. `None` when no order matches.
    async fn find_purchase_order(
        &self,
        po_number: &str,
    ) -> Result<Option<PurchaseOrderSummary>, RemoteError>;

    /// Get a job header.
    async fn get_job(&self, job_id: u64) -> Result<JobSummary, RemoteError>;

    /// List the lines of a purchase order.
    async fn list_order_lines(&self, po_id: PoId) -> Result<Vec<PurchaseOrderLine>, RemoteError>;

    /// List purchase orders still in the pending stage.
    async fn list_pending_orders(&self) -> Result<Vec<PurchaseOrderSummary>, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_exposes_diagnostics() {
        let err = RemoteError::Rejected {
            status: 422,
            endpoint: "/companies/0/stockTransfers/".to_string(),
            request_payload: Some("{}".to_string()),
            response_body: "bad".to_string(),
        };
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.endpoint(), Some("/companies/0/stockTransfers/"));
        assert_eq!(err.request_payload(), Some("{}"));
        assert_eq!(err.response_body(), Some("bad"));
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "HTTP 422 from /companies/0/stockTransfers/");
    }

    #[test]
    fn auth_and_transport_are_fatal() {
        let auth = RemoteError::Auth {
            message: "401".to_string(),
        };
        let transport = RemoteError::Transport {
            endpoint: "/x".to_string(),
            message: "reset".to_string(),
        };
        assert!(auth.is_fatal());
        assert!(transport.is_fatal());
        assert_eq!(auth.endpoint(), None);
        assert_eq!(transport.kind(), "transport");
    }
}
