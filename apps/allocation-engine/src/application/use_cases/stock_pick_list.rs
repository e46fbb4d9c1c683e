//! Stock Pick List Use Case

use std::sync::Arc;

use crate::application::dto::PickListDto;
use crate::application::ports::InventoryPort;
use crate::error::AllocationError;

/// Pending orders looked at when building the pick list.
pub const PICK_LIST_ORDER_LIMIT: usize = 5;

/// Use case for listing jobs with pending orders to pick stock for.
pub struct StockPickListUseCase<P: InventoryPort> {
    inventory: Arc<P>,
}

impl<P: InventoryPort> StockPickListUseCase<P> {
    /// Create a new `StockPickListUseCase`.
    pub const fn new(inventory: Arc<P>) -> Self {
        Self { inventory }
    }

    /// Execute the use case.
    ///
    /// # Errors
    ///
    /// Returns the remote error if pending orders cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self) -> Result<PickListDto, AllocationError> {
        let orders = self.inventory.list_pending_orders().await?;
        tracing::debug!(pending = orders.len(), "Pending orders read");
        Ok(PickListDto::from_orders(
            orders.into_iter().take(PICK_LIST_ORDER_LIMIT),
        ))
    }
}
