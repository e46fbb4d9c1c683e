//! Allocate Items Use Case
//!
//! Routes every line of a purchase order into the target storage device:
//!
//! 1. Repair quantities and validate the request.
//! 2. Build the PO's receipt state once (failures here abort the request).
//! 3. Classify each line into an [`ItemRoute`] and run its strategy. Flag
//!    flips happen inline so later lines see the updated state.
//! 4. Transfer the collected lines, one group per source device.
//! 5. Move the PO to goods received if any pre-receipt write succeeded.
//! 6. Write one allocation log entry.
//!
//! Nothing is rolled back. Remote calls are strictly sequential.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::application::ports::{
    AllocationLogEntry, AllocationLogPort, ErrorLogKind, InventoryPort,
};
use crate::application::services::{
    AllocationContext, PreReceiptStrategy, StockInspector, StockTransferStrategy,
    TransferCandidate,
};
use crate::domain::allocation::{
    AllocationCommand, AllocationMethod, AllocationOutcome, AllocationResult,
    DEFAULT_SERVICE_KEYWORDS, ItemRoute, ReceiptState,
};
use crate::domain::shared::{ReceiptId, StorageDeviceId};
use crate::error::AllocationError;
use crate::observability::{
    record_allocation_request, record_allocation_result, record_receipt_flag,
};
use crate::resilience::PollPolicy;

/// Deployment-specific routing settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingConfig {
    /// Device receipted stock lands in when no receipt says where it is.
    pub stock_holding_device_id: StorageDeviceId,
    /// PO status set once a pre-receipt allocation succeeds.
    pub goods_received_status_id: u64,
    /// Wait after setting a receipt's items-received flag.
    pub settle_delay: Duration,
    /// Keywords marking service lines.
    pub service_keywords: Vec<String>,
}

impl RoutingConfig {
    /// Create a routing config with the default settle delay and keywords.
    #[must_use]
    pub fn new(stock_holding_device_id: StorageDeviceId, goods_received_status_id: u64) -> Self {
        Self {
            stock_holding_device_id,
            goods_received_status_id,
            settle_delay: Duration::from_secs(3),
            service_keywords: DEFAULT_SERVICE_KEYWORDS
                .iter()
                .map(|k| (*k).to_string())
                .collect(),
        }
    }

    /// Set the settle delay.
    #[must_use]
    pub const fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Set the service keywords.
    #[must_use]
    pub fn with_service_keywords(mut self, service_keywords: Vec<String>) -> Self {
        self.service_keywords = service_keywords;
        self
    }
}

/// Use case for allocating purchase-order lines into a storage device.
pub struct AllocateItemsUseCase<P, L>
where
    P: InventoryPort,
    L: AllocationLogPort,
{
    inventory: Arc<P>,
    log: Arc<L>,
    inspector: Arc<StockInspector<P>>,
    pre_receipt: PreReceiptStrategy<P, L>,
    transfer: StockTransferStrategy<P, L>,
    config: RoutingConfig,
}

impl<P, L> AllocateItemsUseCase<P, L>
where
    P: InventoryPort,
    L: AllocationLogPort,
{
    /// Create a new `AllocateItemsUseCase`.
    pub fn new(inventory: Arc<P>, log: Arc<L>, stock_poll: PollPolicy, config: RoutingConfig) -> Self {
        let inspector = Arc::new(StockInspector::new(Arc::clone(&inventory), stock_poll));
        Self {
            pre_receipt: PreReceiptStrategy::new(Arc::clone(&inventory), Arc::clone(&log)),
            transfer: StockTransferStrategy::new(
                Arc::clone(&inventory),
                Arc::clone(&log),
                Arc::clone(&inspector),
            ),
            inventory,
            log,
            inspector,
            config,
        }
    }

    /// Routing settings in use.
    pub const fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Execute the use case.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is invalid or the PO's receipt state
    /// cannot be read. Per-line failures are reported in the outcome.
    #[tracing::instrument(
        skip(self, command),
        fields(
            po_id = %command.po_id,
            po_number = %command.po_number,
            target = %command.target.storage_device_id,
            items = command.items.len()
        )
    )]
    pub async fn execute(
        &self,
        command: AllocationCommand,
    ) -> Result<AllocationOutcome, AllocationError> {
        let started = Instant::now();

        if let Err(e) = command.validate() {
            tracing::warn!(error = %e, "Allocation request rejected");
            record_allocation_request("rejected", started.elapsed().as_secs_f64());
            return Err(e.into());
        }

        let ctx = AllocationContext::from_command(&command);
        let target = &command.target;
        let keywords = &self.config.service_keywords;

        let needs_state = command
            .items
            .iter()
            .any(|item| !item.is_service_line(keywords));
        let mut state = if needs_state {
            match self.inspector.inspect_receipt(command.po_id).await {
                Ok(state) => state,
                Err(e) => {
                    tracing::error!(error = %e, "Could not read receipt state, aborting request");
                    record_allocation_request("failed", started.elapsed().as_secs_f64());
                    return Err(e.into());
                }
            }
        } else {
            ReceiptState::not_receipted()
        };

        let mut results: Vec<Option<AllocationResult>> = vec![None; command.items.len()];
        let mut flag_attempts: HashSet<ReceiptId> = HashSet::new();
        let mut groups: BTreeMap<StorageDeviceId, Vec<(usize, TransferCandidate)>> =
            BTreeMap::new();

        for (index, item) in command.items.iter().enumerate() {
            let quantity = item.requested_quantity();
            if quantity.repaired {
                tracing::debug!(
                    catalog_id = %item.catalog_id,
                    requested = item.quantity_requested,
                    repaired = quantity.value,
                    "Repaired non-positive quantity"
                );
            }

            let route = ItemRoute::classify(item, &state, target.storage_device_id);

            if let ItemRoute::ReceiptedKnownLocationMatchingTarget { current } = &route {
                tracing::info!(catalog_id = %item.catalog_id, "Line already in target device");
                results[index] = Some(
                    AllocationResult::verified(
                        item.catalog_id,
                        current.quantity.max(quantity.value),
                        AllocationMethod::AlreadyAllocated,
                    )
                    .with_message(format!("Already in {}", current.storage_device_name)),
                );
                continue;
            }

            if item.is_service_line(keywords) {
                tracing::debug!(catalog_id = %item.catalog_id, "Skipping service line");
                results[index] = Some(AllocationResult::skipped_service(
                    item.catalog_id,
                    quantity.value,
                ));
                continue;
            }

            tracing::debug!(catalog_id = %item.catalog_id, route = route.label(), "Line classified");

            if matches!(route, ItemRoute::NotReceipted) {
                let result = self
                    .pre_receipt
                    .apply(&ctx, item.catalog_id, quantity, target)
                    .await;
                results[index] = Some(result);
                continue;
            }

            self.flag_receipts(&ctx, route.receipts_to_flag(), &mut state, &mut flag_attempts)
                .await;

            let Some(source) = route.transfer_source(self.config.stock_holding_device_id) else {
                continue;
            };
            if source == target.storage_device_id {
                results[index] = Some(
                    AllocationResult::verified(
                        item.catalog_id,
                        quantity.value,
                        AllocationMethod::AlreadyAllocated,
                    )
                    .with_message("Source and target storage device are the same"),
                );
                continue;
            }

            groups.entry(source).or_default().push((
                index,
                TransferCandidate {
                    catalog_id: item.catalog_id,
                    quantity: quantity.value,
                },
            ));
        }

        for (source, members) in groups {
            let candidates: Vec<TransferCandidate> = members.iter().map(|(_, c)| *c).collect();
            let group_results = self
                .transfer
                .apply(&ctx, source, target.storage_device_id, &candidates)
                .await;
            for ((index, _), result) in members.into_iter().zip(group_results) {
                results[index] = Some(result);
            }
        }

        let results: Vec<AllocationResult> = results
            .into_iter()
            .zip(&command.items)
            .map(|(result, item)| {
                result.unwrap_or_else(|| {
                    AllocationResult::failed(
                        item.catalog_id,
                        item.requested_quantity().value,
                        AllocationMethod::StockTransfer,
                        "Line was not processed",
                    )
                })
            })
            .collect();

        let pre_receipt_succeeded = results
            .iter()
            .any(|r| r.success && r.method == AllocationMethod::PreReceiptAllocation);
        let goods_received_set = if pre_receipt_succeeded {
            self.set_goods_received(&ctx).await
        } else {
            false
        };

        let outcome = AllocationOutcome {
            results,
            goods_received_set,
        };

        for result in &outcome.results {
            record_allocation_result(result.method.as_str(), result.success);
        }
        self.write_log(&command, &outcome).await;

        let success_count = outcome.success_count();
        tracing::info!(
            success_count,
            total = outcome.results.len(),
            all_verified = outcome.all_verified(),
            goods_received_set,
            "Allocation finished"
        );
        record_allocation_request(
            if success_count > 0 { "success" } else { "failed" },
            started.elapsed().as_secs_f64(),
        );

        Ok(outcome)
    }

    /// Set the items-received flag on receipts not yet attempted in this
    /// request, waiting for the ERP to settle after each success.
    async fn flag_receipts(
        &self,
        ctx: &AllocationContext,
        receipts: &[ReceiptId],
        state: &mut ReceiptState,
        attempted: &mut HashSet<ReceiptId>,
    ) {
        for &receipt_id in receipts {
            if !attempted.insert(receipt_id) {
                continue;
            }
            match self
                .inventory
                .mark_items_received(ctx.po_id, receipt_id)
                .await
            {
                Ok(()) => {
                    tracing::info!(receipt_id = %receipt_id, "Items-received flag set");
                    record_receipt_flag("set");
                    state.mark_items_received(receipt_id);
                    tokio::time::sleep(self.config.settle_delay).await;
                }
                Err(e) => {
                    tracing::warn!(receipt_id = %receipt_id, error = %e, "Could not set items-received flag");
                    record_receipt_flag("failed");
                    ctx.record_failure(self.log.as_ref(), ErrorLogKind::ReceiptFlag, None, &e)
                        .await;
                }
            }
        }
    }

    async fn set_goods_received(&self, ctx: &AllocationContext) -> bool {
        match self
            .inventory
            .set_order_status(ctx.po_id, self.config.goods_received_status_id)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    status_id = self.config.goods_received_status_id,
                    "Purchase order marked goods received"
                );
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not mark purchase order goods received");
                ctx.record_failure(self.log.as_ref(), ErrorLogKind::OrderStatus, None, &e)
                    .await;
                false
            }
        }
    }

    async fn write_log(&self, command: &AllocationCommand, outcome: &AllocationOutcome) {
        let entry = AllocationLogEntry {
            staff_id: command.staff.staff_id,
            staff_name: command.staff.display_name.clone(),
            po_number: command.po_number.clone(),
            job_number: command.job_number.clone(),
            vendor_name: command.vendor_name.clone(),
            items_count: outcome.success_count(),
            storage_location: command.target.storage_device_name.clone(),
            allocation_type: outcome.allocation_type(),
            verified: outcome.all_verified(),
            created_at: Utc::now(),
        };
        if let Err(e) = self.log.log_allocation(entry).await {
            tracing::warn!(error = %e, "Failed to write allocation log entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        ReceiptCatalog, ReceiptDetail, RemoteError, StockAllocation,
    };
    use crate::domain::allocation::{
        AllocationTarget, AllocationType, CurrentAllocation, LineItem, ReceiptStatus,
        StaffIdentity,
    };
    use crate::domain::shared::{CatalogId, PoId, StaffId};
    use crate::error::ErrorCode;
    use crate::infrastructure::inventory::{InventoryCall, MockInventory};
    use crate::infrastructure::persistence::InMemoryAllocationLog;

    const PO: PoId = PoId::new(500);
    const HOLDING: StorageDeviceId = StorageDeviceId::new(3);
    const TARGET: StorageDeviceId = StorageDeviceId::new(7);
    const GOODS_RECEIVED: u64 = 42;

    struct Fixture {
        mock: Arc<MockInventory>,
        log: Arc<InMemoryAllocationLog>,
        use_case: AllocateItemsUseCase<MockInventory, InMemoryAllocationLog>,
    }

    fn fixture() -> Fixture {
        let mock = Arc::new(MockInventory::new());
        let log = Arc::new(InMemoryAllocationLog::new());
        let config = RoutingConfig::new(HOLDING, GOODS_RECEIVED).with_settle_delay(Duration::ZERO);
        let use_case = AllocateItemsUseCase::new(
            Arc::clone(&mock),
            Arc::clone(&log),
            PollPolicy::immediate(3),
            config,
        );
        Fixture {
            mock,
            log,
            use_case,
        }
    }

    fn command(target: StorageDeviceId, items: Vec<LineItem>) -> AllocationCommand {
        AllocationCommand::new(PO, AllocationTarget::new(target, format!("Device {target}")))
            .with_items(items)
            .with_staff(StaffIdentity::new(Some(StaffId::new(9)), "Sam"))
    }

    fn line(catalog: u64, quantity: i64) -> LineItem {
        LineItem::new(CatalogId::new(catalog), quantity)
            .with_part(format!("P{catalog}"), "Cable tray")
            .with_quantity_ordered(10)
    }

    fn receipt(id: u64, flag: bool, catalogs: &[(u64, Option<u64>)]) -> ReceiptDetail {
        ReceiptDetail {
            receipt_id: ReceiptId::new(id),
            items_received: Some(flag),
            catalogs: catalogs
                .iter()
                .map(|(catalog, device)| ReceiptCatalog {
                    catalog_id: CatalogId::new(*catalog),
                    allocation: device.map(|d| CurrentAllocation {
                        storage_device_id: StorageDeviceId::new(d),
                        storage_device_name: format!("Device {d}"),
                        quantity: 4,
                    }),
                })
                .collect(),
        }
    }

    fn has_set_allocation(calls: &[InventoryCall]) -> bool {
        calls
            .iter()
            .any(|c| matches!(c, InventoryCall::SetAllocation(..)))
    }

    fn has_transfer(calls: &[InventoryCall]) -> bool {
        calls
            .iter()
            .any(|c| matches!(c, InventoryCall::TransferStock(_)))
    }

    #[tokio::test]
    async fn unreceipted_po_uses_pre_receipt_for_every_line() {
        let f = fixture();

        let outcome = f
            .use_case
            .execute(command(StorageDeviceId::new(5), vec![line(1, 2), line(2, 3)]))
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 2);
        for result in &outcome.results {
            assert_eq!(result.method, AllocationMethod::PreReceiptAllocation);
            assert!(result.success);
        }
        assert_eq!(outcome.success_count(), 2);
        assert!(outcome.goods_received_set);

        let calls = f.mock.calls();
        assert!(!has_transfer(&calls));
        assert!(calls.contains(&InventoryCall::SetOrderStatus(PO, GOODS_RECEIVED)));

        let logged = f.log.allocations();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].allocation_type, AllocationType::PreReceipt);
        assert_eq!(logged[0].items_count, 2);
        assert_eq!(logged[0].staff_name, "Sam");
    }

    #[tokio::test]
    async fn flagged_receipt_transfers_from_current_device() {
        let f = fixture();
        f.mock.add_receipt(PO, receipt(1, true, &[(1, Some(3))]));
        f.mock.put_stock(HOLDING, CatalogId::new(1), 10);

        let outcome = f
            .use_case
            .execute(command(TARGET, vec![line(1, 4)]))
            .await
            .unwrap();

        let result = &outcome.results[0];
        assert_eq!(result.method, AllocationMethod::StockTransfer);
        assert_eq!(result.quantity, 4);
        assert!(result.verified);
        assert!(!outcome.goods_received_set);

        let calls = f.mock.calls();
        assert!(!has_set_allocation(&calls));
        assert!(!calls.iter().any(|c| matches!(c, InventoryCall::MarkItemsReceived(_))));
        let transfers = f.mock.transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].from, HOLDING);
        assert_eq!(transfers[0].to, TARGET);
    }

    #[tokio::test]
    async fn zero_stock_after_retries_skips_line() {
        let f = fixture();
        f.mock.add_receipt(PO, receipt(1, true, &[(1, Some(3))]));
        f.mock.put_stock(HOLDING, CatalogId::new(1), 0);

        let outcome = f
            .use_case
            .execute(command(TARGET, vec![line(1, 4)]))
            .await
            .unwrap();

        let result = &outcome.results[0];
        assert_eq!(result.method, AllocationMethod::SkippedZeroStock);
        assert!(!result.success);
        let stock_reads = f
            .mock
            .calls()
            .iter()
            .filter(|c| matches!(c, InventoryCall::GetStorageStock(_)))
            .count();
        assert_eq!(stock_reads, 4);
        assert!(f.mock.transfers().is_empty());
        assert!(outcome.error_summary().is_some());
    }

    #[tokio::test]
    async fn freight_line_makes_no_remote_calls() {
        let f = fixture();
        let freight = LineItem::new(CatalogId::new(8), 1).with_part("FREIGHT", "Road freight");

        let outcome = f
            .use_case
            .execute(command(TARGET, vec![freight]))
            .await
            .unwrap();

        assert_eq!(outcome.results[0].method, AllocationMethod::SkippedService);
        assert!(outcome.results[0].success);
        assert!(f.mock.calls().is_empty());
    }

    #[tokio::test]
    async fn freight_line_is_untouched_beside_physical_lines() {
        let f = fixture();
        let freight = LineItem::new(CatalogId::new(8), 1).with_part("FREIGHT-01", "");

        let outcome = f
            .use_case
            .execute(command(TARGET, vec![line(1, 1), freight]))
            .await
            .unwrap();

        assert_eq!(outcome.results[1].method, AllocationMethod::SkippedService);
        assert!(
            f.mock
                .calls()
                .iter()
                .all(|c| c.catalog_id() != Some(CatalogId::new(8)))
        );
    }

    #[tokio::test]
    async fn line_already_in_target_makes_no_writes() {
        let f = fixture();
        f.mock.add_receipt(PO, receipt(1, true, &[(1, Some(7)), (2, Some(7))]));

        let outcome = f
            .use_case
            .execute(command(TARGET, vec![line(1, 4), line(2, 4)]))
            .await
            .unwrap();

        for result in &outcome.results {
            assert_eq!(result.method, AllocationMethod::AlreadyAllocated);
            assert!(result.verified);
            assert!(result.success);
        }
        assert!(f.mock.write_calls().is_empty());
        assert_eq!(f.log.allocations()[0].allocation_type, AllocationType::NoMovement);
    }

    #[tokio::test]
    async fn unflagged_receipt_is_flagged_once_then_transferred() {
        let f = fixture();
        f.mock
            .add_receipt(PO, receipt(11, false, &[(1, Some(3)), (2, Some(3))]));
        f.mock.put_stock(HOLDING, CatalogId::new(1), 5);
        f.mock.put_stock(HOLDING, CatalogId::new(2), 5);

        let outcome = f
            .use_case
            .execute(command(TARGET, vec![line(1, 1), line(2, 1)]))
            .await
            .unwrap();

        let flags: Vec<InventoryCall> = f
            .mock
            .calls()
            .into_iter()
            .filter(|c| matches!(c, InventoryCall::MarkItemsReceived(_)))
            .collect();
        assert_eq!(flags, vec![InventoryCall::MarkItemsReceived(ReceiptId::new(11))]);
        assert!(outcome
            .results
            .iter()
            .all(|r| r.method == AllocationMethod::StockTransfer && r.success));
        assert_eq!(f.mock.transfers().len(), 1);
    }

    #[tokio::test]
    async fn unknown_location_flags_open_receipts_and_uses_stock_holding() {
        let f = fixture();
        f.mock.add_receipt(PO, receipt(1, false, &[]));
        f.mock.add_receipt(PO, receipt(2, true, &[]));
        f.mock.add_receipt(PO, receipt(3, false, &[]));
        f.mock.put_stock(HOLDING, CatalogId::new(1), 6);

        let outcome = f
            .use_case
            .execute(command(TARGET, vec![line(1, 2)]))
            .await
            .unwrap();

        let flags: Vec<InventoryCall> = f
            .mock
            .calls()
            .into_iter()
            .filter(|c| matches!(c, InventoryCall::MarkItemsReceived(_)))
            .collect();
        assert_eq!(
            flags,
            vec![
                InventoryCall::MarkItemsReceived(ReceiptId::new(1)),
                InventoryCall::MarkItemsReceived(ReceiptId::new(3)),
            ]
        );
        assert_eq!(outcome.results[0].method, AllocationMethod::StockTransfer);
        assert_eq!(f.mock.transfers()[0].from, HOLDING);
    }

    #[tokio::test]
    async fn failed_flag_is_logged_and_transfer_still_attempted() {
        let f = fixture();
        f.mock.add_receipt(PO, receipt(11, false, &[(1, Some(3))]));
        f.mock.reject_receipt_flag(ReceiptId::new(11));
        f.mock.put_stock(HOLDING, CatalogId::new(1), 5);

        let outcome = f
            .use_case
            .execute(command(TARGET, vec![line(1, 1)]))
            .await
            .unwrap();

        let errors = f.log.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_type, ErrorLogKind::ReceiptFlag);
        assert_eq!(outcome.results[0].method, AllocationMethod::StockTransfer);
    }

    #[tokio::test]
    async fn caller_fully_receipted_status_never_writes_allocation() {
        let f = fixture();
        f.mock.put_stock(HOLDING, CatalogId::new(1), 5);
        let item = line(1, 2).with_receipt_status(ReceiptStatus::FullyReceipted);

        let outcome = f
            .use_case
            .execute(command(TARGET, vec![item]))
            .await
            .unwrap();

        assert_eq!(outcome.results[0].method, AllocationMethod::StockTransfer);
        assert!(!has_set_allocation(&f.mock.calls()));
    }

    #[tokio::test]
    async fn stock_holding_target_is_reported_in_place() {
        let f = fixture();
        f.mock.add_receipt(PO, receipt(1, true, &[]));

        let outcome = f
            .use_case
            .execute(command(HOLDING, vec![line(1, 2)]))
            .await
            .unwrap();

        let result = &outcome.results[0];
        assert_eq!(result.method, AllocationMethod::AlreadyAllocated);
        assert!(result.verified);
        assert!(f.mock.write_calls().is_empty());
    }

    #[tokio::test]
    async fn transfer_never_exceeds_available_stock() {
        for (available, requested) in [(3u32, 8i64), (8, 3), (1, 1), (5, 5)] {
            let f = fixture();
            f.mock.add_receipt(PO, receipt(1, true, &[(1, Some(3))]));
            f.mock.put_stock(HOLDING, CatalogId::new(1), available);

            f.use_case
                .execute(command(TARGET, vec![line(1, requested)]))
                .await
                .unwrap();

            for transfer in f.mock.transfers() {
                for moved in transfer.lines {
                    assert!(moved.quantity <= available);
                }
            }
        }
    }

    #[tokio::test]
    async fn batch_failure_gives_one_result_per_line() {
        let f = fixture();
        f.mock.add_receipt(
            PO,
            receipt(1, true, &[(1, Some(3)), (2, Some(3)), (3, Some(4))]),
        );
        for catalog in 1..=2 {
            f.mock.put_stock(HOLDING, CatalogId::new(catalog), 5);
        }
        f.mock.put_stock(StorageDeviceId::new(4), CatalogId::new(3), 5);
        f.mock.reject_batch_transfers();

        let outcome = f
            .use_case
            .execute(command(TARGET, vec![line(1, 1), line(2, 1), line(3, 1)]))
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 3);
        assert_eq!(
            outcome
                .results
                .iter()
                .map(|r| r.catalog_id.get())
                .collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(outcome.results.iter().all(|r| r.success));
        let singles = f
            .mock
            .transfers()
            .iter()
            .filter(|t| t.lines.len() == 1)
            .count();
        // two retries for the rejected batch, plus the one-line group from device 4
        assert_eq!(singles, 3);
    }

    #[tokio::test]
    async fn second_identical_call_is_already_allocated_before_receipt() {
        let f = fixture();
        let request = command(StorageDeviceId::new(5), vec![line(1, 2), line(2, 3)]);

        let first = f.use_case.execute(request.clone()).await.unwrap();
        assert_eq!(first.success_count(), 2);
        f.mock.clear_calls();

        let second = f.use_case.execute(request).await.unwrap();
        assert!(
            second
                .results
                .iter()
                .all(|r| r.method == AllocationMethod::AlreadyAllocated)
        );
        assert!(f.mock.write_calls().is_empty());
    }

    #[tokio::test]
    async fn second_identical_call_is_already_allocated_after_transfer() {
        let f = fixture();
        f.mock.add_receipt(PO, receipt(1, true, &[(1, Some(3))]));
        f.mock.put_stock(HOLDING, CatalogId::new(1), 10);
        let request = command(TARGET, vec![line(1, 4)]);

        let first = f.use_case.execute(request.clone()).await.unwrap();
        assert_eq!(first.results[0].method, AllocationMethod::StockTransfer);
        f.mock.clear_calls();

        let second = f.use_case.execute(request).await.unwrap();
        assert_eq!(second.results[0].method, AllocationMethod::AlreadyAllocated);
        assert!(f.mock.write_calls().is_empty());
    }

    #[tokio::test]
    async fn empty_request_is_rejected_without_calls() {
        let f = fixture();

        let err = f
            .use_case
            .execute(command(TARGET, vec![]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Validation);
        assert!(f.mock.calls().is_empty());
    }

    #[tokio::test]
    async fn duplicate_catalog_is_rejected() {
        let f = fixture();

        let err = f
            .use_case
            .execute(command(TARGET, vec![line(1, 1), line(1, 2)]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Validation);
        assert!(f.mock.calls().is_empty());
    }

    #[tokio::test]
    async fn auth_failure_reading_receipts_aborts() {
        let f = fixture();
        f.mock.fail_list_receipts(RemoteError::Auth {
            message: "Failed to get token: 401".to_string(),
        });

        let err = f
            .use_case
            .execute(command(TARGET, vec![line(1, 1)]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Auth);
        assert!(f.mock.write_calls().is_empty());
        assert!(f.log.allocations().is_empty());
    }

    #[tokio::test]
    async fn goods_received_failure_keeps_results() {
        let f = fixture();
        f.mock.reject_order_status();

        let outcome = f
            .use_case
            .execute(command(TARGET, vec![line(1, 1)]))
            .await
            .unwrap();

        assert!(outcome.results[0].success);
        assert!(!outcome.goods_received_set);
        assert_eq!(f.log.errors()[0].error_type, ErrorLogKind::OrderStatus);
    }

    #[tokio::test]
    async fn zero_quantity_is_repaired_to_ordered() {
        let f = fixture();

        let outcome = f
            .use_case
            .execute(command(TARGET, vec![line(1, 0)]))
            .await
            .unwrap();

        assert_eq!(outcome.results[0].quantity, 10);
        assert_eq!(
            f.mock.line_allocations(PO, CatalogId::new(1)),
            vec![StockAllocation {
                storage_device_id: TARGET,
                quantity: 10
            }]
        );
    }

    #[tokio::test]
    async fn mixed_routes_keep_input_order() {
        let f = fixture();
        f.mock.add_receipt(PO, receipt(1, true, &[(2, Some(7)), (3, Some(3))]));
        f.mock.put_stock(HOLDING, CatalogId::new(3), 1);
        let freight = LineItem::new(CatalogId::new(4), 1).with_part("", "Delivery charge");

        let outcome = f
            .use_case
            .execute(command(TARGET, vec![line(3, 1), line(2, 1), freight]))
            .await
            .unwrap();

        let methods: Vec<AllocationMethod> = outcome.results.iter().map(|r| r.method).collect();
        assert_eq!(
            methods,
            vec![
                AllocationMethod::StockTransfer,
                AllocationMethod::AlreadyAllocated,
                AllocationMethod::SkippedService,
            ]
        );
        assert!(outcome.all_verified());
        assert_eq!(outcome.allocation_type(), AllocationType::StockTransfer);
    }
}
