//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.

mod allocate_items;
mod list_storage_stock;
mod lookup_purchase_order;
mod relocate_stock;
mod stock_pick_list;

pub use allocate_items::{AllocateItemsUseCase, RoutingConfig};
pub use list_storage_stock::ListStorageStockUseCase;
pub use lookup_purchase_order::LookupPurchaseOrderUseCase;
pub use relocate_stock::RelocateStockUseCase;
pub use stock_pick_list::{PICK_LIST_ORDER_LIMIT, StockPickListUseCase};
