//! Shared Kernel
//!
//! Identifier types used across the allocation context.

mod identifiers;

pub use identifiers::{CatalogId, PoId, ReceiptId, StaffId, StorageDeviceId};
