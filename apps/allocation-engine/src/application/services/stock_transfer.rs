//! Post-Receipt Transfer Strategy
//!
//! Moves receipted stock from its source device to the target with the ERP's
//! stock transfer, one batch per source device. A rejected batch is replayed
//! one line at a time so a bad line cannot sink its siblings.

use std::sync::Arc;

use crate::application::ports::{
    AllocationLogPort, ErrorLogKind, InventoryPort, StockTransferRequest, TransferLine,
};
use crate::application::services::{AllocationContext, StockInspector};
use crate::domain::allocation::{AllocationMethod, AllocationResult};
use crate::domain::shared::{CatalogId, StorageDeviceId};

/// A line waiting to be transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferCandidate {
    /// Catalog id.
    pub catalog_id: CatalogId,
    /// Quantity requested.
    pub quantity: u32,
}

enum Slot {
    Resolved(AllocationResult),
    Confirmed {
        line: TransferLine,
        note: Option<String>,
    },
}

/// Transfers receipted stock between storage devices.
pub struct StockTransferStrategy<P: InventoryPort, L: AllocationLogPort> {
    inventory: Arc<P>,
    log: Arc<L>,
    inspector: Arc<StockInspector<P>>,
}

impl<P: InventoryPort, L: AllocationLogPort> StockTransferStrategy<P, L> {
    /// Create the strategy.
    pub const fn new(inventory: Arc<P>, log: Arc<L>, inspector: Arc<StockInspector<P>>) -> Self {
        Self {
            inventory,
            log,
            inspector,
        }
    }

    /// Transfer a same-source group. Returns one result per candidate, in order.
    #[tracing::instrument(
        skip(self, ctx, items),
        fields(po_id = %ctx.po_id, source = %source, target = %target, items = items.len())
    )]
    pub async fn apply(
        &self,
        ctx: &AllocationContext,
        source: StorageDeviceId,
        target: StorageDeviceId,
        items: &[TransferCandidate],
    ) -> Vec<AllocationResult> {
        let mut slots = Vec::with_capacity(items.len());
        for item in items {
            slots.push(self.confirm_stock(source, item).await);
        }

        let lines: Vec<TransferLine> = slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Confirmed { line, .. } => Some(*line),
                Slot::Resolved(_) => None,
            })
            .collect();

        if lines.is_empty() {
            tracing::info!("No stock confirmed at source, transfer abandoned");
            return finish(slots, |_| None);
        }

        let batch = StockTransferRequest::new(source, target, lines);
        match self.inventory.transfer_stock(&batch).await {
            Ok(()) => {
                tracing::info!(lines = batch.lines.len(), "Batch stock transfer completed");
                finish(slots, |_| Some(Ok(())))
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    lines = batch.lines.len(),
                    "Batch stock transfer rejected, retrying per line"
                );
                ctx.record_failure(
                    self.log.as_ref(),
                    ErrorLogKind::StockTransferBatch,
                    None,
                    &e,
                )
                .await;

                let mut outcomes = Vec::with_capacity(batch.lines.len());
                for line in &batch.lines {
                    let single = StockTransferRequest::new(source, target, vec![*line]);
                    let outcome = self.inventory.transfer_stock(&single).await;
                    if let Err(e) = &outcome {
                        tracing::warn!(catalog_id = %line.catalog_id, error = %e, "Stock transfer rejected");
                        ctx.record_failure(
                            self.log.as_ref(),
                            ErrorLogKind::StockTransferItem,
                            Some(line.catalog_id),
                            e,
                        )
                        .await;
                    }
                    outcomes.push((line.catalog_id, outcome));
                }
                finish(slots, |catalog_id| {
                    outcomes
                        .iter()
                        .find(|(id, _)| *id == catalog_id)
                        .map(|(_, outcome)| outcome.clone().map_err(|e| e.to_string()))
                })
            }
        }
    }

    async fn confirm_stock(&self, source: StorageDeviceId, item: &TransferCandidate) -> Slot {
        match self.inspector.check_stock_level(source, item.catalog_id).await {
            Err(e) => {
                tracing::warn!(catalog_id = %item.catalog_id, error = %e, "Stock check failed");
                Slot::Resolved(AllocationResult::failed(
                    item.catalog_id,
                    item.quantity,
                    AllocationMethod::SkippedStockCheckFailed,
                    format!("Stock check failed: {e}"),
                ))
            }
            Ok(0) => Slot::Resolved(AllocationResult::failed(
                item.catalog_id,
                item.quantity,
                AllocationMethod::SkippedZeroStock,
                format!("No stock available in storage device {source}"),
            )),
            Ok(available) if available < item.quantity => {
                tracing::info!(
                    catalog_id = %item.catalog_id,
                    requested = item.quantity,
                    available,
                    "Capping transfer to available stock"
                );
                Slot::Confirmed {
                    line: TransferLine {
                        catalog_id: item.catalog_id,
                        quantity: available,
                    },
                    note: Some(format!(
                        "Only {available} of {} available, transferred {available}",
                        item.quantity
                    )),
                }
            }
            Ok(_) => Slot::Confirmed {
                line: TransferLine {
                    catalog_id: item.catalog_id,
                    quantity: item.quantity,
                },
                note: None,
            },
        }
    }
}

/// Turn slots into results. `outcome` gives the transfer outcome of a
/// confirmed line, or `None` when it was never sent.
fn finish<F>(slots: Vec<Slot>, outcome: F) -> Vec<AllocationResult>
where
    F: Fn(CatalogId) -> Option<Result<(), String>>,
{
    slots
        .into_iter()
        .map(|slot| match slot {
            Slot::Resolved(result) => result,
            Slot::Confirmed { line, note } => match outcome(line.catalog_id) {
                Some(Ok(())) => {
                    let result = AllocationResult::verified(
                        line.catalog_id,
                        line.quantity,
                        AllocationMethod::StockTransfer,
                    );
                    match note {
                        Some(note) => result.with_message(note),
                        None => result,
                    }
                }
                Some(Err(error)) => AllocationResult::failed(
                    line.catalog_id,
                    line.quantity,
                    AllocationMethod::StockTransfer,
                    format!("Stock transfer failed: {error}"),
                ),
                None => AllocationResult::failed(
                    line.catalog_id,
                    line.quantity,
                    AllocationMethod::StockTransfer,
                    "Stock transfer not attempted",
                ),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::allocation::StaffIdentity;
    use crate::domain::shared::PoId;
    use crate::infrastructure::inventory::{InventoryCall, MockInventory};
    use crate::infrastructure::persistence::InMemoryAllocationLog;
    use crate::resilience::PollPolicy;

    const SOURCE: StorageDeviceId = StorageDeviceId::new(3);
    const TARGET: StorageDeviceId = StorageDeviceId::new(7);

    struct Fixture {
        mock: Arc<MockInventory>,
        log: Arc<InMemoryAllocationLog>,
        strategy: StockTransferStrategy<MockInventory, InMemoryAllocationLog>,
    }

    fn fixture() -> Fixture {
        let mock = Arc::new(MockInventory::new());
        let log = Arc::new(InMemoryAllocationLog::new());
        let inspector = Arc::new(StockInspector::new(
            Arc::clone(&mock),
            PollPolicy::immediate(3),
        ));
        let strategy = StockTransferStrategy::new(Arc::clone(&mock), Arc::clone(&log), inspector);
        Fixture {
            mock,
            log,
            strategy,
        }
    }

    fn ctx() -> AllocationContext {
        AllocationContext::new(PoId::new(1), "1", StaffIdentity::unknown())
    }

    fn candidate(catalog: u64, quantity: u32) -> TransferCandidate {
        TransferCandidate {
            catalog_id: CatalogId::new(catalog),
            quantity,
        }
    }

    #[tokio::test]
    async fn transfers_group_in_one_batch() {
        let f = fixture();
        f.mock.put_stock(SOURCE, CatalogId::new(1), 10);
        f.mock.put_stock(SOURCE, CatalogId::new(2), 10);

        let results = f
            .strategy
            .apply(&ctx(), SOURCE, TARGET, &[candidate(1, 4), candidate(2, 2)])
            .await;

        assert!(results.iter().all(|r| r.success && r.verified));
        assert!(results.iter().all(|r| r.method == AllocationMethod::StockTransfer));
        let transfers = f.mock.transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].lines.len(), 2);
        assert_eq!(transfers[0].from, SOURCE);
        assert_eq!(transfers[0].to, TARGET);
    }

    #[tokio::test]
    async fn quantity_is_capped_at_availability() {
        let f = fixture();
        f.mock.put_stock(SOURCE, CatalogId::new(1), 3);

        let results = f
            .strategy
            .apply(&ctx(), SOURCE, TARGET, &[candidate(1, 8)])
            .await;

        assert_eq!(results[0].quantity, 3);
        assert!(results[0].message.is_some());
        assert_eq!(f.mock.transfers()[0].lines[0].quantity, 3);
    }

    #[tokio::test]
    async fn zero_stock_skips_without_transfer() {
        let f = fixture();
        f.mock.put_stock(SOURCE, CatalogId::new(1), 0);

        let results = f
            .strategy
            .apply(&ctx(), SOURCE, TARGET, &[candidate(1, 4)])
            .await;

        assert_eq!(results[0].method, AllocationMethod::SkippedZeroStock);
        assert!(!results[0].success);
        assert!(f.mock.transfers().is_empty());
    }

    #[tokio::test]
    async fn failed_stock_check_skips_line() {
        let f = fixture();
        f.mock.fail_stock_reads(SOURCE);

        let results = f
            .strategy
            .apply(&ctx(), SOURCE, TARGET, &[candidate(1, 4)])
            .await;

        assert_eq!(results[0].method, AllocationMethod::SkippedStockCheckFailed);
        assert!(f.mock.transfers().is_empty());
    }

    #[tokio::test]
    async fn batch_failure_retries_each_line_once() {
        let f = fixture();
        for catalog in 1..=3 {
            f.mock.put_stock(SOURCE, CatalogId::new(catalog), 10);
        }
        f.mock.reject_batch_transfers();
        f.mock.reject_transfer_of(CatalogId::new(2));

        let results = f
            .strategy
            .apply(
                &ctx(),
                SOURCE,
                TARGET,
                &[candidate(1, 1), candidate(2, 1), candidate(3, 1)],
            )
            .await;

        let transfers = f.mock.transfers();
        assert_eq!(transfers.len(), 4);
        assert_eq!(transfers.iter().filter(|t| t.lines.len() == 1).count(), 3);

        assert_eq!(results.len(), 3);
        assert_eq!(
            results.iter().map(|r| r.catalog_id.get()).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(results[0].success);
        assert!(!results[1].success);
        assert!(results[2].success);

        let kinds: Vec<ErrorLogKind> = f.log.errors().iter().map(|e| e.error_type).collect();
        assert_eq!(
            kinds,
            vec![ErrorLogKind::StockTransferBatch, ErrorLogKind::StockTransferItem]
        );
    }

    #[tokio::test]
    async fn mixed_group_keeps_input_order() {
        let f = fixture();
        f.mock.put_stock(SOURCE, CatalogId::new(1), 0);
        f.mock.put_stock(SOURCE, CatalogId::new(2), 5);

        let results = f
            .strategy
            .apply(&ctx(), SOURCE, TARGET, &[candidate(1, 1), candidate(2, 1)])
            .await;

        assert_eq!(results[0].method, AllocationMethod::SkippedZeroStock);
        assert_eq!(results[1].method, AllocationMethod::StockTransfer);
        let stock_reads = f
            .mock
            .calls()
            .iter()
            .filter(|c| matches!(c, InventoryCall::GetStorageStock(_)))
            .count();
        assert_eq!(stock_reads, 5);
    }
}
