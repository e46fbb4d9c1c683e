//! Relocate Stock Use Case
//!
//! Moves stock lines that already sit in one storage device into another,
//! through the same capped, batch-then-per-line transfer the allocation
//! router uses for receipted stock. Writes one audit log entry.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::application::ports::{AllocationLogEntry, AllocationLogPort, InventoryPort};
use crate::application::services::{
    AllocationContext, StockInspector, StockTransferStrategy, TransferCandidate,
};
use crate::domain::allocation::{AllocationOutcome, AllocationType, RelocationCommand};
use crate::error::AllocationError;
use crate::observability::{record_allocation_result, record_relocation_request};
use crate::resilience::PollPolicy;

/// Use case for moving stock between storage devices.
pub struct RelocateStockUseCase<P, L>
where
    P: InventoryPort,
    L: AllocationLogPort,
{
    log: Arc<L>,
    transfer: StockTransferStrategy<P, L>,
}

impl<P, L> RelocateStockUseCase<P, L>
where
    P: InventoryPort,
    L: AllocationLogPort,
{
    /// Create a new `RelocateStockUseCase`.
    pub fn new(inventory: Arc<P>, log: Arc<L>, stock_poll: PollPolicy) -> Self {
        let inspector = Arc::new(StockInspector::new(Arc::clone(&inventory), stock_poll));
        Self {
            transfer: StockTransferStrategy::new(inventory, Arc::clone(&log), inspector),
            log,
        }
    }

    /// Execute the use case.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the command is invalid. Per-line
    /// failures are reported in the outcome.
    #[tracing::instrument(
        skip(self, command),
        fields(
            source = %command.source.storage_device_id,
            destination = %command.destination.storage_device_id,
            items = command.items.len()
        )
    )]
    pub async fn execute(
        &self,
        command: RelocationCommand,
    ) -> Result<AllocationOutcome, AllocationError> {
        let started = Instant::now();

        if let Err(e) = command.validate() {
            tracing::warn!(error = %e, "Relocation request rejected");
            record_relocation_request("rejected", started.elapsed().as_secs_f64());
            return Err(e.into());
        }

        let candidates: Vec<TransferCandidate> = command
            .merged_items()
            .iter()
            .map(|item| TransferCandidate {
                catalog_id: item.catalog_id,
                quantity: item.quantity,
            })
            .collect();

        let ctx = AllocationContext::relocation(command.staff.clone());
        let results = self
            .transfer
            .apply(
                &ctx,
                command.source.storage_device_id,
                command.destination.storage_device_id,
                &candidates,
            )
            .await;

        let outcome = AllocationOutcome {
            results,
            goods_received_set: false,
        };

        for result in &outcome.results {
            record_allocation_result(result.method.as_str(), result.success);
        }
        self.write_log(&command, &outcome).await;

        let success_count = outcome.success_count();
        tracing::info!(
            success_count,
            total = outcome.results.len(),
            "Relocation finished"
        );
        record_relocation_request(
            if success_count > 0 { "success" } else { "failed" },
            started.elapsed().as_secs_f64(),
        );

        Ok(outcome)
    }

    async fn write_log(&self, command: &RelocationCommand, outcome: &AllocationOutcome) {
        let entry = AllocationLogEntry {
            staff_id: command.staff.staff_id,
            staff_name: command.staff.display_name.clone(),
            po_number: String::new(),
            job_number: String::new(),
            vendor_name: String::new(),
            items_count: outcome.success_count(),
            storage_location: format!(
                "{} -> {}",
                command.source.storage_device_name, command.destination.storage_device_name
            ),
            allocation_type: AllocationType::Relocation,
            verified: outcome.all_verified(),
            created_at: Utc::now(),
        };
        if let Err(e) = self.log.log_allocation(entry).await {
            tracing::warn!(error = %e, "Failed to write relocation log entry");
        }
    }
}
