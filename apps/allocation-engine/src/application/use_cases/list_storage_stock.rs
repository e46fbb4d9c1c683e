//! List Storage Stock Use Case

use std::sync::Arc;

use crate::application::dto::StorageStockDto;
use crate::application::ports::InventoryPort;
use crate::domain::shared::StorageDeviceId;
use crate::error::AllocationError;

/// Use case for listing the stock held in a storage device.
pub struct ListStorageStockUseCase<P: InventoryPort> {
    inventory: Arc<P>,
}

impl<P: InventoryPort> ListStorageStockUseCase<P> {
    /// Create a new `ListStorageStockUseCase`.
    pub const fn new(inventory: Arc<P>) -> Self {
        Self { inventory }
    }

    /// Execute the use case.
    ///
    /// # Errors
    ///
    /// Returns the remote error if the stock cannot be read.
    #[tracing::instrument(skip(self), fields(storage_id = %storage_id))]
    pub async fn execute(
        &self,
        storage_id: StorageDeviceId,
    ) -> Result<StorageStockDto, AllocationError> {
        let lines = self.inventory.get_storage_stock(storage_id).await?;
        tracing::debug!(lines = lines.len(), "Storage stock read");
        Ok(StorageStockDto::new(storage_id, lines))
    }
}
