//! Pre-Receipt Strategy
//!
//! Places stock by writing the order line's storage allocation. Only valid
//! while the PO has no receipt: once receipted, the ERP would book the
//! allocation against the cost centre a second time.

use std::sync::Arc;

use crate::application::ports::{AllocationLogPort, ErrorLogKind, InventoryPort, StockAllocation};
use crate::application::services::AllocationContext;
use crate::domain::allocation::{
    AllocationMethod, AllocationResult, AllocationTarget, RequestedQuantity,
};
use crate::domain::shared::CatalogId;

const UNVERIFIED_MESSAGE: &str =
    "Allocation accepted but not visible on read-back, check the order line in simPRO";

/// Writes allocations on order lines of unreceipted purchase orders.
pub struct PreReceiptStrategy<P: InventoryPort, L: AllocationLogPort> {
    inventory: Arc<P>,
    log: Arc<L>,
}

impl<P: InventoryPort, L: AllocationLogPort> PreReceiptStrategy<P, L> {
    /// Create the strategy.
    pub const fn new(inventory: Arc<P>, log: Arc<L>) -> Self {
        Self { inventory, log }
    }

    /// Allocate one line to the target device and read the allocation back.
    ///
    /// Never fails the request: errors become a failed result and an error
    /// log entry.
    #[tracing::instrument(
        skip(self, ctx, quantity, target),
        fields(po_id = %ctx.po_id, catalog_id = %catalog_id, target = %target.storage_device_id)
    )]
    pub async fn apply(
        &self,
        ctx: &AllocationContext,
        catalog_id: CatalogId,
        quantity: RequestedQuantity,
        target: &AllocationTarget,
    ) -> AllocationResult {
        let existing = match self.inventory.get_allocations(ctx.po_id, catalog_id).await {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read existing allocations");
                Vec::new()
            }
        };

        let existing_total = existing
            .iter()
            .fold(0u32, |total, a| total.saturating_add(a.quantity));
        let desired = if quantity.repaired && existing_total > 0 {
            existing_total
        } else {
            quantity.value
        };

        if !existing.is_empty()
            && existing
                .iter()
                .all(|a| a.storage_device_id == target.storage_device_id)
            && existing_total == desired
        {
            tracing::info!(quantity = desired, "Line already allocated to target");
            return AllocationResult::verified(
                catalog_id,
                desired,
                AllocationMethod::AlreadyAllocated,
            )
            .with_message(format!("Already allocated to {}", target.storage_device_name));
        }

        let allocation = StockAllocation {
            storage_device_id: target.storage_device_id,
            quantity: desired,
        };
        if let Err(e) = self
            .inventory
            .set_allocation(ctx.po_id, catalog_id, allocation)
            .await
        {
            tracing::warn!(error = %e, "Allocation write rejected");
            ctx.record_failure(
                self.log.as_ref(),
                ErrorLogKind::PreReceiptAllocation,
                Some(catalog_id),
                &e,
            )
            .await;
            return AllocationResult::failed(
                catalog_id,
                desired,
                AllocationMethod::PreReceiptAllocation,
                format!("Allocation failed: {e}"),
            );
        }

        let verified = match self.inventory.get_allocations(ctx.po_id, catalog_id).await {
            Ok(after) => after
                .iter()
                .any(|a| a.storage_device_id == target.storage_device_id),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read allocation back");
                false
            }
        };

        if verified {
            tracing::info!(quantity = desired, "Pre-receipt allocation verified");
            AllocationResult::verified(catalog_id, desired, AllocationMethod::PreReceiptAllocation)
        } else {
            tracing::warn!(quantity = desired, "Pre-receipt allocation not verified");
            AllocationResult::unverified(
                catalog_id,
                desired,
                AllocationMethod::PreReceiptAllocation,
            )
            .with_message(UNVERIFIED_MESSAGE)
        }
    }
}
