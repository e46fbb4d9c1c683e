//! simPRO inventory adapter implementing InventoryPort.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use crate::application::ports::{
    InventoryPort, JobSummary, PurchaseOrderLine, PurchaseOrderSummary, ReceiptDetail,
    RemoteError, StockAllocation, StockLine, StockTransferRequest,
};
use crate::domain::shared::{CatalogId, PoId, ReceiptId, StorageDeviceId};

use super::api_types::{
    AllocationResponse, AllocationWrite, IdOnly, JobResponse, OrderStatusPatch,
    ReceiptFlagPatch, ReceiptResponse, StockResponse, StockTransferBody,
    VendorOrderCatalogResponse, VendorOrderResponse,
};
use super::config::SimproConfig;
use super::error::SimproError;
use super::http_client::SimproHttpClient;

/// simPRO inventory adapter.
///
/// Implements `InventoryPort` for the simPRO REST API.
#[derive(Debug, Clone)]
pub struct SimproInventoryAdapter {
    client: SimproHttpClient,
    config: SimproConfig,
}

impl SimproInventoryAdapter {
    /// Create a new simPRO adapter.
    pub fn new(config: SimproConfig) -> Result<Self, SimproError> {
        let client = SimproHttpClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// Create an adapter around an existing HTTP client.
    #[must_use]
    pub const fn with_client(config: SimproConfig, client: SimproHttpClient) -> Self {
        Self { client, config }
    }

    fn path(&self, resource: &str) -> String {
        self.config.company_path(resource)
    }

    fn allocations_path(&self, po_id: PoId, catalog_id: CatalogId) -> String {
        self.path(&format!(
            "vendorOrders/{po_id}/catalogs/{catalog_id}/allocations/"
        ))
    }

    fn receipt_path(&self, po_id: PoId, receipt_id: ReceiptId) -> String {
        self.path(&format!("vendorOrders/{po_id}/receipts/{receipt_id}"))
    }

    fn encode<T: serde::Serialize>(path: &str, body: &T) -> Result<serde_json::Value, RemoteError> {
        serde_json::to_value(body).map_err(|e| RemoteError::Decode {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl InventoryPort for SimproInventoryAdapter {
    async fn list_receipts(&self, po_id: PoId) -> Result<Vec<ReceiptId>, RemoteError> {
        let path = self.path(&format!("vendorOrders/{po_id}/receipts/"));
        let receipts: Option<Vec<IdOnly>> = self.client.get_json(&path).await?;
        Ok(receipts
            .unwrap_or_default()
            .into_iter()
            .map(|r| ReceiptId::new(r.id))
            .collect())
    }

    async fn get_receipt(
        &self,
        po_id: PoId,
        receipt_id: ReceiptId,
    ) -> Result<ReceiptDetail, RemoteError> {
        let path = self.receipt_path(po_id, receipt_id);
        let receipt: ReceiptResponse = self.client.get_json(&path).await?;
        Ok(receipt.into())
    }

    async fn mark_items_received(
        &self,
        po_id: PoId,
        receipt_id: ReceiptId,
    ) -> Result<(), RemoteError> {
        let path = self.receipt_path(po_id, receipt_id);
        let body = Self::encode(&path, &ReceiptFlagPatch {
            items_received: true,
        })?;
        self.client.send_json(Method::PATCH, &path, &body).await?;
        tracing::debug!(po_id = %po_id, receipt_id = %receipt_id, "Receipt flagged as items received");
        Ok(())
    }

    async fn get_allocations(
        &self,
        po_id: PoId,
        catalog_id: CatalogId,
    ) -> Result<Vec<StockAllocation>, RemoteError> {
        let path = self.allocations_path(po_id, catalog_id);
        let allocations: Option<Vec<AllocationResponse>> = self.client.get_json(&path).await?;
        Ok(allocations
            .unwrap_or_default()
            .into_iter()
            .map(StockAllocation::from)
            .collect())
    }

    async fn set_allocation(
        &self,
        po_id: PoId,
        catalog_id: CatalogId,
        allocation: StockAllocation,
    ) -> Result<(), RemoteError> {
        let path = self.allocations_path(po_id, catalog_id);
        let body = Self::encode(&path, &[AllocationWrite::from(allocation)])?;
        self.client.send_json(Method::PUT, &path, &body).await?;
        Ok(())
    }

    async fn get_storage_stock(
        &self,
        storage_device_id: StorageDeviceId,
    ) -> Result<Vec<StockLine>, RemoteError> {
        let path = self.path(&format!("storageDevices/{storage_device_id}/stock/"));
        let stock: Option<Vec<StockResponse>> = self.client.get_json(&path).await?;
        Ok(stock
            .unwrap_or_default()
            .into_iter()
            .filter_map(StockResponse::into_stock_line)
            .collect())
    }

    async fn transfer_stock(&self, request: &StockTransferRequest) -> Result<(), RemoteError> {
        let path = self.path("stockTransfers/");
        let body = Self::encode(&path, &StockTransferBody::from(request))?;
        self.client.send_json(Method::POST, &path, &body).await?;
        tracing::info!(
            from = %request.from,
            to = %request.to,
            lines = request.lines.len(),
            "Stock transfer accepted"
        );
        Ok(())
    }

    async fn set_order_status(&self, po_id: PoId, status_id: u64) -> Result<(), RemoteError> {
        let path = self.path(&format!("vendorOrders/{po_id}"));
        let body = Self::encode(&path, &OrderStatusPatch { status: status_id })?;
        self.client.send_json(Method::PATCH, &path, &body).await?;
        Ok(())
    }

    async fn find_purchase_order(
        &self,
        po_number: &str,
    ) -> Result<Option<PurchaseOrderSummary>, RemoteError> {
        if po_number.is_empty() || !po_number.chars().all(|c| c.is_ascii_digit()) {
            tracing::debug!(po_number, "PO number is not numeric, skipping search");
            return Ok(None);
        }
        let path = self.path(&format!("vendorOrders/?ID={po_number}"));
        let orders: Option<Vec<VendorOrderResponse>> = self.client.get_json(&path).await?;
        Ok(orders
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(PurchaseOrderSummary::from))
    }

    async fn get_job(&self, job_id: u64) -> Result<JobSummary, RemoteError> {
        let path = self.path(&format!("jobs/{job_id}/?columns=ID,Name,Customer"));
        let job: JobResponse = self.client.get_json(&path).await?;
        Ok(job.into())
    }

    async fn list_order_lines(&self, po_id: PoId) -> Result<Vec<PurchaseOrderLine>, RemoteError> {
        let path = self.path(&format!("vendorOrders/{po_id}/catalogs/"));
        let lines: Option<Vec<VendorOrderCatalogResponse>> = self.client.get_json(&path).await?;
        Ok(lines
            .unwrap_or_default()
            .into_iter()
            .map(PurchaseOrderLine::from)
            .collect())
    }

    async fn list_pending_orders(&self) -> Result<Vec<PurchaseOrderSummary>, RemoteError> {
        let path = self.path("vendorOrders/?Stage=Pending&columns=ID,Job,Vendor");
        let orders: Option<Vec<VendorOrderResponse>> = self.client.get_json(&path).await?;
        Ok(orders
            .unwrap_or_default()
            .into_iter()
            .map(PurchaseOrderSummary::from)
            .collect())
    }
}
