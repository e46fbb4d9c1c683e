//! Storage stock DTOs

use serde::{Deserialize, Serialize};

use crate::application::ports::StockLine;
use crate::domain::shared::{CatalogId, StorageDeviceId};

/// A storage device staff can pick from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocationDto {
    /// Device id.
    pub id: StorageDeviceId,
    /// Display name.
    pub name: String,
}

/// One stock line held in a storage device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItemDto {
    /// ERP stock record id, when the ERP returns one.
    pub stock_id: Option<u64>,
    /// Catalog id.
    pub catalog_id: CatalogId,
    /// Supplier part number.
    pub part_no: String,
    /// Description.
    pub description: String,
    /// Quantity held.
    pub quantity: u32,
    /// Job the stock is reserved for.
    pub job_id: Option<u64>,
    /// Name of that job.
    pub job_name: Option<String>,
}

impl From<StockLine> for StockItemDto {
    fn from(line: StockLine) -> Self {
        Self {
            stock_id: line.stock_id,
            catalog_id: line.catalog_id,
            part_no: line.part_no,
            description: line.description,
            quantity: line.quantity,
            job_id: line.job_id,
            job_name: line.job_name,
        }
    }
}

/// Response body of `GET /api/storage/{storage_id}/stock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStockDto {
    /// Stock lines.
    pub items: Vec<StockItemDto>,
    /// Number of lines.
    pub count: usize,
    /// Device the stock was read from.
    pub storage_id: StorageDeviceId,
}

impl StorageStockDto {
    /// Build the response from the device's stock lines.
    #[must_use]
    pub fn new(storage_id: StorageDeviceId, lines: Vec<StockLine>) -> Self {
        let items: Vec<StockItemDto> = lines.into_iter().map(StockItemDto::from).collect();
        Self {
            count: items.len(),
            items,
            storage_id,
        }
    }
}
