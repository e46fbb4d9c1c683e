//! Inventory Adapters
//!
//! Implementations of `InventoryPort` besides the simPRO one.

pub mod mock;

pub use mock::{InventoryCall, MockInventory};
