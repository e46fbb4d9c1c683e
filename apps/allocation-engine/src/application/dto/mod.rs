//! Data Transfer Objects (DTOs)
//!
//! JSON shapes of the HTTP API. Field names are camelCase on the wire.

mod allocation_dto;
mod pick_list_dto;
mod purchase_order_dto;
mod relocation_dto;
mod storage_dto;

pub use allocation_dto::{AllocateItemDto, AllocateRequestDto, AllocateResponseDto};
pub use pick_list_dto::{PickListDto, PickListItemDto};
pub use purchase_order_dto::{PurchaseOrderDto, PurchaseOrderItemDto, UNKNOWN_VENDOR};
pub use relocation_dto::{RelocateItemDto, RelocateRequestDto, RelocateResponseDto};
pub use storage_dto::{StockItemDto, StorageLocationDto, StorageStockDto};
