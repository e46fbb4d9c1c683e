//! Allocation Bounded Context
//!
//! Decides how each purchase-order line reaches its target storage device,
//! and how stock already on a shelf moves to another one.

mod command;
mod errors;
mod line_item;
mod receipt_state;
mod relocation;
mod result;
mod routing;

pub use command::{AllocationCommand, AllocationTarget, StaffIdentity};
pub use errors::{AllocationRequestError, RelocationRequestError};
pub use line_item::{DEFAULT_SERVICE_KEYWORDS, LineItem, ReceiptStatus, RequestedQuantity};
pub use receipt_state::{CatalogReceipt, CurrentAllocation, ReceiptState, ReceiptSummary};
pub use relocation::{RelocationCommand, RelocationItem};
pub use result::{AllocationMethod, AllocationOutcome, AllocationResult, AllocationType};
pub use routing::ItemRoute;
