//! Stock State Inspector
//!
//! Read-only view of a purchase order's receipting state and of the stock
//! held in a storage device.

use std::sync::Arc;

use crate::application::ports::{InventoryPort, RemoteError};
use crate::domain::allocation::ReceiptState;
use crate::domain::shared::{CatalogId, PoId, StorageDeviceId};
use crate::observability::record_stock_poll_retry;
use crate::resilience::{PollBackoff, PollPolicy};

/// Reads receipting state and stock levels from the ERP.
pub struct StockInspector<P: InventoryPort> {
    inventory: Arc<P>,
    stock_poll: PollPolicy,
}

impl<P: InventoryPort> StockInspector<P> {
    /// Create an inspector that polls empty stock reads per `stock_poll`.
    pub const fn new(inventory: Arc<P>, stock_poll: PollPolicy) -> Self {
        Self {
            inventory,
            stock_poll,
        }
    }

    /// Build the receipting snapshot of a purchase order.
    ///
    /// Any receipt makes the PO receipted, whatever its flag. A receipt whose
    /// detail the ERP refuses keeps the PO receipted and contributes no
    /// catalogs.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipts cannot be listed, or if a detail read
    /// fails on authentication or transport.
    #[tracing::instrument(skip(self), fields(po_id = %po_id))]
    pub async fn inspect_receipt(&self, po_id: PoId) -> Result<ReceiptState, RemoteError> {
        let receipt_ids = self.inventory.list_receipts(po_id).await?;
        if receipt_ids.is_empty() {
            tracing::debug!("No receipts on purchase order");
            return Ok(ReceiptState::not_receipted());
        }

        let mut state = ReceiptState::default();
        for receipt_id in receipt_ids {
            let detail = match self.inventory.get_receipt(po_id, receipt_id).await {
                Ok(detail) => detail,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        receipt_id = %receipt_id,
                        error = %e,
                        "Receipt detail unavailable, its lines fall back to the stock holding device"
                    );
                    state.record_receipt(receipt_id, false);
                    continue;
                }
            };

            let items_received = detail.items_received.unwrap_or_else(|| {
                tracing::debug!(receipt_id = %receipt_id, "Receipt has no items-received flag");
                false
            });
            state.record_receipt(receipt_id, items_received);

            for catalog in detail.catalogs {
                let conflict = state.record_catalog(
                    catalog.catalog_id,
                    receipt_id,
                    items_received,
                    catalog.allocation,
                );
                if let Some(previous) = conflict {
                    tracing::warn!(
                        catalog_id = %catalog.catalog_id,
                        receipt_id = %receipt_id,
                        previous_flag = previous,
                        flag = items_received,
                        "Receipts disagree on items-received flag, using the later receipt"
                    );
                }
            }
        }

        tracing::debug!(receipts = state.receipts().len(), "Receipt state built");
        Ok(state)
    }

    /// Quantity of a catalog on hand in a storage device.
    ///
    /// A zero read is repeated per the poll policy while the ERP settles;
    /// zero is returned once the retries are spent.
    ///
    /// # Errors
    ///
    /// Returns an error if a stock read fails.
    #[tracing::instrument(skip(self), fields(device = %storage_device_id, catalog_id = %catalog_id))]
    pub async fn check_stock_level(
        &self,
        storage_device_id: StorageDeviceId,
        catalog_id: CatalogId,
    ) -> Result<u32, RemoteError> {
        let mut backoff = PollBackoff::new(&self.stock_poll);
        loop {
            let available = self.read_stock(storage_device_id, catalog_id).await?;
            if available > 0 {
                return Ok(available);
            }
            let Some(delay) = backoff.next_delay() else {
                tracing::info!(
                    attempts = backoff.current_attempt() + 1,
                    "Stock still zero after polling"
                );
                return Ok(0);
            };
            record_stock_poll_retry();
            tracing::debug!(delay_ms = delay.as_millis(), "Stock is zero, re-reading");
            tokio::time::sleep(delay).await;
        }
    }

    async fn read_stock(
        &self,
        storage_device_id: StorageDeviceId,
        catalog_id: CatalogId,
    ) -> Result<u32, RemoteError> {
        let lines = self.inventory.get_storage_stock(storage_device_id).await?;
        Ok(lines
            .iter()
            .filter(|line| line.catalog_id == catalog_id)
            .fold(0u32, |total, line| total.saturating_add(line.quantity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ReceiptCatalog, ReceiptDetail};
    use crate::domain::allocation::CurrentAllocation;
    use crate::domain::shared::ReceiptId;
    use crate::infrastructure::inventory::{InventoryCall, MockInventory};

    const PO: PoId = PoId::new(100);
    const SHELF: StorageDeviceId = StorageDeviceId::new(3);

    fn inspector(mock: &Arc<MockInventory>, retries: u32) -> StockInspector<MockInventory> {
        StockInspector::new(Arc::clone(mock), PollPolicy::immediate(retries))
    }

    fn receipt(id: u64, flag: Option<bool>, catalogs: &[(u64, Option<u64>)]) -> ReceiptDetail {
        ReceiptDetail {
            receipt_id: ReceiptId::new(id),
            items_received: flag,
            catalogs: catalogs
                .iter()
                .map(|(catalog, device)| ReceiptCatalog {
                    catalog_id: CatalogId::new(*catalog),
                    allocation: device.map(|d| CurrentAllocation {
                        storage_device_id: StorageDeviceId::new(d),
                        storage_device_name: format!("Device {d}"),
                        quantity: 1,
                    }),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn no_receipts_is_not_receipted() {
        let mock = Arc::new(MockInventory::new());
        let state = inspector(&mock, 0).inspect_receipt(PO).await.unwrap();
        assert!(!state.receipt_exists());
        assert_eq!(mock.calls(), vec![InventoryCall::ListReceipts(PO)]);
    }

    #[tokio::test]
    async fn receipts_are_read_into_state() {
        let mock = Arc::new(MockInventory::new());
        mock.add_receipt(PO, receipt(1, Some(true), &[(10, Some(3)), (11, None)]));
        mock.add_receipt(PO, receipt(2, None, &[(12, Some(4))]));

        let state = inspector(&mock, 0).inspect_receipt(PO).await.unwrap();

        assert!(state.receipt_exists());
        assert_eq!(state.unflagged_receipts(), vec![ReceiptId::new(2)]);
        let ten = state.catalog(CatalogId::new(10)).unwrap();
        assert!(ten.items_received);
        assert_eq!(ten.allocation.as_ref().unwrap().storage_device_id, SHELF);
        assert!(state.catalog(CatalogId::new(11)).unwrap().allocation.is_none());
        assert!(!state.catalog(CatalogId::new(12)).unwrap().items_received);
    }

    #[tokio::test]
    async fn later_receipt_wins_on_conflict() {
        let mock = Arc::new(MockInventory::new());
        mock.add_receipt(PO, receipt(1, Some(true), &[(10, Some(3))]));
        mock.add_receipt(PO, receipt(2, Some(false), &[(10, Some(4))]));

        let state = inspector(&mock, 0).inspect_receipt(PO).await.unwrap();
        let entry = state.catalog(CatalogId::new(10)).unwrap();
        assert_eq!(entry.receipt_id, ReceiptId::new(2));
        assert!(!entry.items_received);
    }

    #[tokio::test]
    async fn rejected_detail_keeps_po_receipted() {
        let mock = Arc::new(MockInventory::new());
        mock.add_receipt(PO, receipt(1, Some(true), &[(10, Some(3))]));
        mock.fail_receipt(
            ReceiptId::new(1),
            RemoteError::Rejected {
                status: 500,
                endpoint: "receipts/1".to_string(),
                request_payload: None,
                response_body: String::new(),
            },
        );

        let state = inspector(&mock, 0).inspect_receipt(PO).await.unwrap();
        assert!(state.receipt_exists());
        assert!(state.catalog(CatalogId::new(10)).is_none());
        assert_eq!(state.unflagged_receipts(), vec![ReceiptId::new(1)]);
    }

    #[tokio::test]
    async fn auth_failure_on_detail_propagates() {
        let mock = Arc::new(MockInventory::new());
        mock.add_receipt(PO, receipt(1, Some(true), &[]));
        mock.fail_receipt(
            ReceiptId::new(1),
            RemoteError::Auth {
                message: "token refused".to_string(),
            },
        );

        let result = inspector(&mock, 0).inspect_receipt(PO).await;
        assert!(matches!(result, Err(RemoteError::Auth { .. })));
    }

    #[tokio::test]
    async fn stock_level_returns_first_positive_read() {
        let mock = Arc::new(MockInventory::new());
        mock.script_stock(SHELF, CatalogId::new(1), vec![0, 0, 6]);

        let level = inspector(&mock, 3)
            .check_stock_level(SHELF, CatalogId::new(1))
            .await
            .unwrap();

        assert_eq!(level, 6);
        assert_eq!(mock.calls().len(), 3);
    }

    #[tokio::test]
    async fn stock_level_gives_up_after_retries() {
        let mock = Arc::new(MockInventory::new());
        mock.put_stock(SHELF, CatalogId::new(1), 0);

        let level = inspector(&mock, 3)
            .check_stock_level(SHELF, CatalogId::new(1))
            .await
            .unwrap();

        assert_eq!(level, 0);
        assert_eq!(mock.calls().len(), 4);
    }

    #[tokio::test]
    async fn stock_read_error_propagates() {
        let mock = Arc::new(MockInventory::new());
        mock.fail_stock_reads(SHELF);

        let result = inspector(&mock, 3)
            .check_stock_level(SHELF, CatalogId::new(1))
            .await;

        assert!(matches!(result, Err(RemoteError::Rejected { status: 500, .. })));
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn default_policy_waits_between_reads() {
        let mock = Arc::new(MockInventory::new());
        mock.put_stock(SHELF, CatalogId::new(1), 0);
        let inspector = StockInspector::new(Arc::clone(&mock), PollPolicy::default());

        let started = tokio::time::Instant::now();
        let level = inspector
            .check_stock_level(SHELF, CatalogId::new(1))
            .await
            .unwrap();

        assert_eq!(level, 0);
        assert!(started.elapsed() >= std::time::Duration::from_secs(9));
    }
}
