//! Application Ports (Driver and Driven)
//!
//! Ports define interfaces for interacting with external systems.
//! - **Driver Ports** (Primary/Inbound): How the world uses our application
//! - **Driven Ports** (Secondary/Outbound): How our application uses external systems

mod allocation_log_port;
mod inventory_port;

pub use allocation_log_port::{
    AllocationLogEntry, AllocationLogError, AllocationLogPort, ErrorLogEntry, ErrorLogKind,
    NoOpAllocationLog,
};
pub use inventory_port::{
    InventoryPort, JobSummary, PurchaseOrderLine, PurchaseOrderSummary, ReceiptCatalog,
    ReceiptDetail, RemoteError, StockAllocation, StockLine, StockTransferRequest, TransferLine,
};
