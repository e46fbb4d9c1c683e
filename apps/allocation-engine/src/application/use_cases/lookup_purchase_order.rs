//! Lookup Purchase Order Use Case
//!
//! Resolves a PO number to the order, its job and its lines so the operator
//! can pick what to allocate.

use std::sync::Arc;

use crate::application::dto::PurchaseOrderDto;
use crate::application::ports::InventoryPort;
use crate::error::AllocationError;

/// Use case for looking up a purchase order by number.
pub struct LookupPurchaseOrderUseCase<P: InventoryPort> {
    inventory: Arc<P>,
}

impl<P: InventoryPort> LookupPurchaseOrderUseCase<P> {
    /// Create a new `LookupPurchaseOrderUseCase`.
    pub const fn new(inventory: Arc<P>) -> Self {
        Self { inventory }
    }

    /// Execute the use case.
    ///
    /// The job read is best effort: a failure leaves job name and customer
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no order has the number, or the remote error
    /// when the order or its lines cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, po_number: &str) -> Result<PurchaseOrderDto, AllocationError> {
        let po_number = po_number.trim();
        if po_number.is_empty() {
            return Err(AllocationError::validation("PO number is required"));
        }

        let order = self
            .inventory
            .find_purchase_order(po_number)
            .await?
            .ok_or_else(|| AllocationError::po_not_found(po_number))?;

        let job = match order.job_id {
            Some(job_id) => match self.inventory.get_job(job_id).await {
                Ok(job) => Some(job),
                Err(e) => {
                    tracing::warn!(job_id, error = %e, "Could not read job for purchase order");
                    None
                }
            },
            None => None,
        };

        let lines = self.inventory.list_order_lines(order.po_id).await?;
        tracing::debug!(po_id = %order.po_id, lines = lines.len(), "Purchase order found");

        Ok(PurchaseOrderDto::new(po_number, order, job, lines))
    }
}
