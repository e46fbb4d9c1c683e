//! In-memory ERP for testing.
//!
//! Keeps receipts, order-line allocations and device stock in memory, applies
//! writes the way the ERP does, and records every call so tests can assert
//! which endpoints were touched.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::application::ports::{
    InventoryPort, JobSummary, PurchaseOrderLine, PurchaseOrderSummary, ReceiptDetail,
    RemoteError, StockAllocation, StockLine, StockTransferRequest,
};
use crate::domain::allocation::CurrentAllocation;
use crate::domain::shared::{CatalogId, PoId, ReceiptId, StorageDeviceId};

/// A call made against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryCall {
    /// `list_receipts`
    ListReceipts(PoId),
    /// `get_receipt`
    GetReceipt(ReceiptId),
    /// `mark_items_received`
    MarkItemsReceived(ReceiptId),
    /// `get_allocations`
    GetAllocations(CatalogId),
    /// `set_allocation`
    SetAllocation(CatalogId, StockAllocation),
    /// `get_storage_stock`
    GetStorageStock(StorageDeviceId),
    /// `transfer_stock`
    TransferStock(StockTransferRequest),
    /// `set_order_status`
    SetOrderStatus(PoId, u64),
    /// `find_purchase_order`
    FindPurchaseOrder(String),
    /// `get_job`
    GetJob(u64),
    /// `list_order_lines`
    ListOrderLines(PoId),
    /// `list_pending_orders`
    ListPendingOrders,
}

impl InventoryCall {
    /// True for calls that change ERP state.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(
            self,
            Self::MarkItemsReceived(_)
                | Self::SetAllocation(..)
                | Self::TransferStock(_)
                | Self::SetOrderStatus(..)
        )
    }

    /// Catalog the call concerns, for per-line calls.
    #[must_use]
    pub fn catalog_id(&self) -> Option<CatalogId> {
        match self {
            Self::GetAllocations(id) | Self::SetAllocation(id, _) => Some(*id),
            Self::TransferStock(request) if request.lines.len() == 1 => {
                request.lines.first().map(|l| l.catalog_id)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<InventoryCall>,
    receipts: HashMap<PoId, Vec<ReceiptDetail>>,
    allocations: HashMap<(PoId, CatalogId), Vec<StockAllocation>>,
    stock: HashMap<StorageDeviceId, Vec<StockLine>>,
    scripted_stock: HashMap<(StorageDeviceId, CatalogId), VecDeque<u32>>,
    orders: HashMap<String, PurchaseOrderSummary>,
    jobs: HashMap<u64, JobSummary>,
    lines: HashMap<PoId, Vec<PurchaseOrderLine>>,
    pending_orders: Vec<PurchaseOrderSummary>,
    list_receipts_error: Option<RemoteError>,
    receipt_errors: HashMap<ReceiptId, RemoteError>,
    reject_allocation_writes: HashSet<CatalogId>,
    reject_batch_transfers: bool,
    reject_transfers_of: HashSet<CatalogId>,
    stock_read_errors: HashSet<StorageDeviceId>,
    reject_receipt_flags: HashSet<ReceiptId>,
    reject_order_status: bool,
    unverifiable_allocations: bool,
}

/// In-memory ERP for testing.
#[derive(Debug, Default)]
pub struct MockInventory {
    state: Mutex<State>,
}

fn rejected(status: u16, endpoint: impl Into<String>) -> RemoteError {
    RemoteError::Rejected {
        status,
        endpoint: endpoint.into(),
        request_payload: None,
        response_body: "{\"errors\":[{\"message\":\"rejected by mock\"}]}".to_string(),
    }
}

impl MockInventory {
    /// Create an empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a receipt to a PO.
    pub fn add_receipt(&self, po_id: PoId, receipt: ReceiptDetail) {
        self.state().receipts.entry(po_id).or_default().push(receipt);
    }

    /// Set the allocations of an order line.
    pub fn set_line_allocations(
        &self,
        po_id: PoId,
        catalog_id: CatalogId,
        allocations: Vec<StockAllocation>,
    ) {
        self.state().allocations.insert((po_id, catalog_id), allocations);
    }

    /// Put stock of a catalog in a device.
    pub fn put_stock(&self, device: StorageDeviceId, catalog_id: CatalogId, quantity: u32) {
        let mut state = self.state();
        let lines = state.stock.entry(device).or_default();
        match lines.iter_mut().find(|l| l.catalog_id == catalog_id) {
            Some(line) => line.quantity = quantity,
            None => lines.push(StockLine {
                stock_id: None,
                catalog_id,
                part_no: format!("P-{catalog_id}"),
                description: format!("Catalog {catalog_id}"),
                quantity,
                job_id: None,
                job_name: None,
            }),
        }
    }

    /// Script successive stock reads of a catalog at a device. The last value
    /// repeats once the script runs out.
    pub fn script_stock(&self, device: StorageDeviceId, catalog_id: CatalogId, reads: Vec<u32>) {
        self.state()
            .scripted_stock
            .insert((device, catalog_id), reads.into());
    }

    /// Register a purchase order for lookups.
    pub fn add_order(&self, po_number: &str, order: PurchaseOrderSummary, lines: Vec<PurchaseOrderLine>) {
        let mut state = self.state();
        state.lines.insert(order.po_id, lines);
        state.orders.insert(po_number.to_string(), order);
    }

    /// Add a purchase order to the pending stage.
    pub fn add_pending_order(&self, order: PurchaseOrderSummary) {
        self.state().pending_orders.push(order);
    }

    /// Register a job for lookups.
    pub fn add_job(&self, job: JobSummary) {
        self.state().jobs.insert(job.job_id, job);
    }

    /// Fail receipt listing with the given error.
    pub fn fail_list_receipts(&self, error: RemoteError) {
        self.state().list_receipts_error = Some(error);
    }

    /// Fail the detail read of one receipt.
    pub fn fail_receipt(&self, receipt_id: ReceiptId, error: RemoteError) {
        self.state().receipt_errors.insert(receipt_id, error);
    }

    /// Reject allocation writes for a catalog with HTTP 422.
    pub fn reject_allocation_write(&self, catalog_id: CatalogId) {
        self.state().reject_allocation_writes.insert(catalog_id);
    }

    /// Accept allocation writes without applying them, so read-backs miss.
    pub fn drop_allocation_writes(&self) {
        self.state().unverifiable_allocations = true;
    }

    /// Reject any transfer carrying more than one line.
    pub fn reject_batch_transfers(&self) {
        self.state().reject_batch_transfers = true;
    }

    /// Reject any transfer that includes this catalog.
    pub fn reject_transfer_of(&self, catalog_id: CatalogId) {
        self.state().reject_transfers_of.insert(catalog_id);
    }

    /// Fail stock reads of a device with HTTP 500.
    pub fn fail_stock_reads(&self, device: StorageDeviceId) {
        self.state().stock_read_errors.insert(device);
    }

    /// Reject the items-received patch of a receipt.
    pub fn reject_receipt_flag(&self, receipt_id: ReceiptId) {
        self.state().reject_receipt_flags.insert(receipt_id);
    }

    /// Reject purchase order status changes.
    pub fn reject_order_status(&self) {
        self.state().reject_order_status = true;
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<InventoryCall> {
        self.state().calls.clone()
    }

    /// Every state-changing call made so far.
    #[must_use]
    pub fn write_calls(&self) -> Vec<InventoryCall> {
        self.state().calls.iter().filter(|c| c.is_write()).cloned().collect()
    }

    /// Transfers submitted so far.
    #[must_use]
    pub fn transfers(&self) -> Vec<StockTransferRequest> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                InventoryCall::TransferStock(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded calls, keeping ERP state.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Current allocations of an order line.
    #[must_use]
    pub fn line_allocations(&self, po_id: PoId, catalog_id: CatalogId) -> Vec<StockAllocation> {
        self.state()
            .allocations
            .get(&(po_id, catalog_id))
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, call: InventoryCall) {
        self.state().calls.push(call);
    }
}

#[async_trait]
impl InventoryPort for MockInventory {
    async fn list_receipts(&self, po_id: PoId) -> Result<Vec<ReceiptId>, RemoteError> {
        self.record(InventoryCall::ListReceipts(po_id));
        let state = self.state();
        if let Some(error) = &state.list_receipts_error {
            return Err(error.clone());
        }
        Ok(state
            .receipts
            .get(&po_id)
            .map(|r| r.iter().map(|d| d.receipt_id).collect())
            .unwrap_or_default())
    }

    async fn get_receipt(
        &self,
        po_id: PoId,
        receipt_id: ReceiptId,
    ) -> Result<ReceiptDetail, RemoteError> {
        self.record(InventoryCall::GetReceipt(receipt_id));
        let state = self.state();
        if let Some(error) = state.receipt_errors.get(&receipt_id) {
            return Err(error.clone());
        }
        state
            .receipts
            .get(&po_id)
            .and_then(|r| r.iter().find(|d| d.receipt_id == receipt_id))
            .cloned()
            .ok_or_else(|| rejected(404, format!("receipts/{receipt_id}")))
    }

    async fn mark_items_received(
        &self,
        po_id: PoId,
        receipt_id: ReceiptId,
    ) -> Result<(), RemoteError> {
        self.record(InventoryCall::MarkItemsReceived(receipt_id));
        let mut state = self.state();
        if state.reject_receipt_flags.contains(&receipt_id) {
            return Err(rejected(422, format!("receipts/{receipt_id}")));
        }
        if let Some(receipt) = state
            .receipts
            .get_mut(&po_id)
            .and_then(|r| r.iter_mut().find(|d| d.receipt_id == receipt_id))
        {
            receipt.items_received = Some(true);
        }
        Ok(())
    }

    async fn get_allocations(
        &self,
        po_id: PoId,
        catalog_id: CatalogId,
    ) -> Result<Vec<StockAllocation>, RemoteError> {
        self.record(InventoryCall::GetAllocations(catalog_id));
        Ok(self.line_allocations(po_id, catalog_id))
    }

    async fn set_allocation(
        &self,
        po_id: PoId,
        catalog_id: CatalogId,
        allocation: StockAllocation,
    ) -> Result<(), RemoteError> {
        self.record(InventoryCall::SetAllocation(catalog_id, allocation));
        let mut state = self.state();
        if state.reject_allocation_writes.contains(&catalog_id) {
            return Err(rejected(422, format!("catalogs/{catalog_id}/allocations/")));
        }
        if !state.unverifiable_allocations {
            state.allocations.insert((po_id, catalog_id), vec![allocation]);
        }
        Ok(())
    }

    async fn get_storage_stock(
        &self,
        storage_device_id: StorageDeviceId,
    ) -> Result<Vec<StockLine>, RemoteError> {
        self.record(InventoryCall::GetStorageStock(storage_device_id));
        let mut state = self.state();
        if state.stock_read_errors.contains(&storage_device_id) {
            return Err(rejected(500, format!("storageDevices/{storage_device_id}/stock/")));
        }

        let scripted: Vec<(CatalogId, u32)> = state
            .scripted_stock
            .iter_mut()
            .filter(|((device, _), _)| *device == storage_device_id)
            .filter_map(|((_, catalog), reads)| {
                let value = if reads.len() > 1 {
                    reads.pop_front()
                } else {
                    reads.front().copied()
                };
                value.map(|v| (*catalog, v))
            })
            .collect();
        drop(state);
        for (catalog, quantity) in scripted {
            self.put_stock(storage_device_id, catalog, quantity);
        }

        Ok(self
            .state()
            .stock
            .get(&storage_device_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn transfer_stock(&self, request: &StockTransferRequest) -> Result<(), RemoteError> {
        self.record(InventoryCall::TransferStock(request.clone()));
        let mut state = self.state();
        if state.reject_batch_transfers && request.lines.len() > 1 {
            return Err(rejected(422, "stockTransfers/"));
        }
        if request
            .lines
            .iter()
            .any(|l| state.reject_transfers_of.contains(&l.catalog_id))
        {
            return Err(rejected(422, "stockTransfers/"));
        }

        for line in &request.lines {
            if let Some(source) = state
                .stock
                .get_mut(&request.from)
                .and_then(|s| s.iter_mut().find(|s| s.catalog_id == line.catalog_id))
            {
                source.quantity = source.quantity.saturating_sub(line.quantity);
            }
            state.scripted_stock.remove(&(request.from, line.catalog_id));

            for receipt in state.receipts.values_mut().flatten() {
                for catalog in receipt
                    .catalogs
                    .iter_mut()
                    .filter(|c| c.catalog_id == line.catalog_id)
                {
                    catalog.allocation = Some(CurrentAllocation {
                        storage_device_id: request.to,
                        storage_device_name: format!("Device {}", request.to),
                        quantity: line.quantity,
                    });
                }
            }
        }
        Ok(())
    }

    async fn set_order_status(&self, po_id: PoId, status_id: u64) -> Result<(), RemoteError> {
        self.record(InventoryCall::SetOrderStatus(po_id, status_id));
        if self.state().reject_order_status {
            return Err(rejected(422, format!("vendorOrders/{po_id}")));
        }
        Ok(())
    }

    async fn find_purchase_order(
        &self,
        po_number: &str,
    ) -> Result<Option<PurchaseOrderSummary>, RemoteError> {
        self.record(InventoryCall::FindPurchaseOrder(po_number.to_string()));
        Ok(self.state().orders.get(po_number).cloned())
    }

    async fn get_job(&self, job_id: u64) -> Result<JobSummary, RemoteError> {
        self.record(InventoryCall::GetJob(job_id));
        self.state()
            .jobs
            .get(&job_id)
            .cloned()
            .ok_or_else(|| rejected(404, format!("jobs/{job_id}/")))
    }

    async fn list_order_lines(&self, po_id: PoId) -> Result<Vec<PurchaseOrderLine>, RemoteError> {
        self.record(InventoryCall::ListOrderLines(po_id));
        Ok(self.state().lines.get(&po_id).cloned().unwrap_or_default())
    }

    async fn list_pending_orders(&self) -> Result<Vec<PurchaseOrderSummary>, RemoteError> {
        self.record(InventoryCall::ListPendingOrders);
        Ok(self.state().pending_orders.clone())
    }
}
