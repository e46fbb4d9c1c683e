//! Allocation Log Port (Driven Port)
//!
//! Audit trail of allocations and remote write failures. Writes are best
//! effort: a failed log write never changes an allocation outcome.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::allocation::AllocationType;
use crate::domain::shared::{CatalogId, StaffId};

/// One allocation request, written after every line is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationLogEntry {
    /// Staff id, when known.
    pub staff_id: Option<StaffId>,
    /// Staff display name.
    pub staff_name: String,
    /// PO number.
    pub po_number: String,
    /// Job number.
    pub job_number: String,
    /// Vendor name.
    pub vendor_name: String,
    /// Lines that succeeded.
    pub items_count: usize,
    /// Target storage device name.
    pub storage_location: String,
    /// Which strategies moved stock.
    pub allocation_type: AllocationType,
    /// Whether every success was verified.
    pub verified: bool,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

/// Kind of remote write that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorLogKind {
    /// Allocation write on an order line.
    PreReceiptAllocation,
    /// Items-received flag on a receipt.
    ReceiptFlag,
    /// Batched stock transfer.
    StockTransferBatch,
    /// Single-item stock transfer.
    StockTransferItem,
    /// Purchase order status change.
    OrderStatus,
}

impl ErrorLogKind {
    /// Get the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PreReceiptAllocation => "pre_receipt_allocation",
            Self::ReceiptFlag => "receipt_flag",
            Self::StockTransferBatch => "stock_transfer_batch",
            Self::StockTransferItem => "stock_transfer_item",
            Self::OrderStatus => "order_status",
        }
    }
}

/// One failed remote write, with enough detail to replay it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    /// Kind of write.
    pub error_type: ErrorLogKind,
    /// PO number.
    pub po_number: String,
    /// Catalog involved, when the write was per line.
    pub catalog_id: Option<CatalogId>,
    /// Staff display name.
    pub staff_user: String,
    /// HTTP status or error kind.
    pub error_code: String,
    /// Human-readable message.
    pub error_message: String,
    /// JSON payload sent.
    pub request_payload: Option<String>,
    /// Body received.
    pub response_body: Option<String>,
    /// Remote path.
    pub endpoint: Option<String>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

/// Allocation log error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AllocationLogError {
    /// The log store could not be written.
    #[error("Allocation log write failed: {message}")]
    WriteFailed {
        /// Error details.
        message: String,
    },
}

/// Port for the allocation audit log.
#[async_trait]
pub trait AllocationLogPort: Send + Sync {
    /// Record a completed allocation request.
    async fn log_allocation(&self, entry: AllocationLogEntry) -> Result<(), AllocationLogError>;

    /// Record a failed remote write.
    async fn log_error(&self, entry: ErrorLogEntry) -> Result<(), AllocationLogError>;
}

/// Allocation log that discards everything.
#[derive(Debug, Clone, Default)]
pub struct NoOpAllocationLog;

#[async_trait]
impl AllocationLogPort for NoOpAllocationLog {
    async fn log_allocation(&self, _entry: AllocationLogEntry) -> Result<(), AllocationLogError> {
        Ok(())
    }

    async fn log_error(&self, _entry: ErrorLogEntry) -> Result<(), AllocationLogError> {
        Ok(())
    }
}
