//! Application Services
//!
//! Services the allocation use case composes: the read-only stock inspector
//! and the two placement strategies.

mod context;
mod pre_receipt;
mod stock_inspector;
mod stock_transfer;

pub use context::AllocationContext;
pub use pre_receipt::PreReceiptStrategy;
pub use stock_inspector::StockInspector;
pub use stock_transfer::{StockTransferStrategy, TransferCandidate};
