//! simPRO API request and response types.
//!
//! These types map directly to simPRO's REST format. Only the fields the
//! engine reads are declared.

use serde::{Deserialize, Serialize};

use crate::application::ports::{
    JobSummary, PurchaseOrderLine, PurchaseOrderSummary, ReceiptCatalog, ReceiptDetail,
    StockAllocation, StockLine, StockTransferRequest,
};
use crate::domain::allocation::CurrentAllocation;
use crate::domain::shared::{CatalogId, PoId, ReceiptId, StorageDeviceId};

/// Description used when a catalog has no name.
const UNKNOWN_ITEM: &str = "Unknown Item";

/// Convert an API quantity (sent as a decimal) to whole units, rounding
/// down so a fractional remainder is never counted as a unit on hand.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_units(quantity: f64) -> u32 {
    if quantity.is_finite() && quantity > 0.0 {
        quantity.floor().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token.
    pub access_token: String,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

// ============================================================================
// Shared references
// ============================================================================

/// A related record, sent either as a bare id or as an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    /// Bare id.
    Id(u64),
    /// Expanded record.
    Record(NamedRecord),
}

/// Expanded related record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NamedRecord {
    /// Record id.
    #[serde(rename = "ID")]
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Part number (catalogs only).
    #[serde(default)]
    pub part_no: Option<String>,
    /// Company name (vendors and customers).
    #[serde(default)]
    pub company_name: Option<String>,
}

impl Reference {
    /// Id of the referenced record.
    #[must_use]
    pub const fn id(&self) -> u64 {
        match self {
            Self::Id(id) => *id,
            Self::Record(record) => record.id,
        }
    }

    /// Expanded record, if the API sent one.
    #[must_use]
    pub const fn record(&self) -> Option<&NamedRecord> {
        match self {
            Self::Id(_) => None,
            Self::Record(record) => Some(record),
        }
    }
}

/// Record that is only read for its id.
#[derive(Debug, Clone, Deserialize)]
pub struct IdOnly {
    /// Record id.
    #[serde(rename = "ID")]
    pub id: u64,
}

/// Company reference (vendor or customer).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompanyRef {
    /// Company name.
    #[serde(default)]
    pub company_name: Option<String>,
}

// ============================================================================
// Vendor orders and jobs
// ============================================================================

/// Vendor order as returned by the order search.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VendorOrderResponse {
    /// Order id.
    #[serde(rename = "ID")]
    pub id: u64,
    /// Vendor.
    #[serde(default)]
    pub vendor: Option<CompanyRef>,
    /// Job the order belongs to.
    #[serde(default)]
    pub job: Option<Reference>,
    /// Order stage.
    #[serde(default)]
    pub stage: Option<String>,
}

impl From<VendorOrderResponse> for PurchaseOrderSummary {
    fn from(order: VendorOrderResponse) -> Self {
        Self {
            po_id: PoId::new(order.id),
            vendor_name: order.vendor.and_then(|v| v.company_name),
            job_id: order.job.map(|j| j.id()).filter(|id| *id > 0),
            stage: order.stage,
        }
    }
}

/// Job summary response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobResponse {
    /// Job id.
    #[serde(rename = "ID")]
    pub id: u64,
    /// Job name.
    #[serde(default)]
    pub name: Option<String>,
    /// Customer.
    #[serde(default)]
    pub customer: Option<CompanyRef>,
}

impl From<JobResponse> for JobSummary {
    fn from(job: JobResponse) -> Self {
        Self {
            job_id: job.id,
            name: job.name,
            customer_name: job.customer.and_then(|c| c.company_name),
        }
    }
}

/// One catalog line of a vendor order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VendorOrderCatalogResponse {
    /// Catalog.
    pub catalog: Reference,
    /// Line description, used when the catalog has no name.
    #[serde(default)]
    pub description: Option<String>,
    /// Quantity ordered.
    #[serde(default)]
    pub quantity: f64,
    /// Quantity receipted.
    #[serde(default)]
    pub quantity_received: f64,
}

impl From<VendorOrderCatalogResponse> for PurchaseOrderLine {
    fn from(line: VendorOrderCatalogResponse) -> Self {
        let record = line.catalog.record().cloned().unwrap_or_default();
        Self {
            catalog_id: CatalogId::new(line.catalog.id()),
            part_no: record.part_no.unwrap_or_default(),
            description: record
                .name
                .or(line.description)
                .unwrap_or_else(|| UNKNOWN_ITEM.to_string()),
            quantity_ordered: whole_units(line.quantity),
            quantity_received: whole_units(line.quantity_received),
        }
    }
}

/// Vendor order status change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderStatusPatch {
    /// New status id.
    pub status: u64,
}

// ============================================================================
// Allocations
// ============================================================================

/// One allocation of an order line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AllocationResponse {
    /// Storage device.
    pub storage_device: Reference,
    /// Quantity.
    #[serde(default)]
    pub quantity: f64,
}

impl AllocationResponse {
    fn to_current(&self) -> CurrentAllocation {
        let id = self.storage_device.id();
        CurrentAllocation {
            storage_device_id: StorageDeviceId::new(id),
            storage_device_name: self
                .storage_device
                .record()
                .and_then(|r| r.name.clone())
                .unwrap_or_else(|| format!("Storage {id}")),
            quantity: whole_units(self.quantity),
        }
    }
}

impl From<AllocationResponse> for StockAllocation {
    fn from(allocation: AllocationResponse) -> Self {
        Self {
            storage_device_id: StorageDeviceId::new(allocation.storage_device.id()),
            quantity: whole_units(allocation.quantity),
        }
    }
}

/// Allocation write body element. The API takes a one-element array.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AllocationWrite {
    /// Storage device id.
    pub storage_device: u64,
    /// Quantity.
    pub quantity: u32,
}

impl From<StockAllocation> for AllocationWrite {
    fn from(allocation: StockAllocation) -> Self {
        Self {
            storage_device: allocation.storage_device_id.get(),
            quantity: allocation.quantity,
        }
    }
}

// ============================================================================
// Receipts
// ============================================================================

/// Receipt detail.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiptResponse {
    /// Receipt id.
    #[serde(rename = "ID")]
    pub id: u64,
    /// Items-received flag. Absent on some API versions.
    #[serde(default)]
    pub items_received: Option<bool>,
    /// Catalog lines on the receipt.
    #[serde(default)]
    pub catalogs: Vec<ReceiptCatalogResponse>,
}

/// One catalog line of a receipt.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiptCatalogResponse {
    /// Catalog.
    pub catalog: Reference,
    /// Where the receipted stock went.
    #[serde(default)]
    pub allocations: Vec<AllocationResponse>,
}

impl From<ReceiptResponse> for ReceiptDetail {
    fn from(receipt: ReceiptResponse) -> Self {
        Self {
            receipt_id: ReceiptId::new(receipt.id),
            items_received: receipt.items_received,
            catalogs: receipt
                .catalogs
                .into_iter()
                .map(|line| {
                    let allocation = line
                        .allocations
                        .iter()
                        .find(|a| a.quantity > 0.0)
                        .or_else(|| line.allocations.first())
                        .map(AllocationResponse::to_current);
                    ReceiptCatalog {
                        catalog_id: CatalogId::new(line.catalog.id()),
                        allocation,
                    }
                })
                .collect(),
        }
    }
}

/// Receipt flag change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiptFlagPatch {
    /// Items-received flag.
    pub items_received: bool,
}

// ============================================================================
// Storage stock and transfers
// ============================================================================

/// One stock line of a storage device.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StockResponse {
    /// Stock record id.
    #[serde(default, rename = "ID")]
    pub id: Option<u64>,
    /// Alternative stock record id.
    #[serde(default, rename = "StockID")]
    pub stock_id: Option<u64>,
    /// Catalog.
    #[serde(default)]
    pub catalog: Option<Reference>,
    /// Part number, when the catalog is not expanded.
    #[serde(default)]
    pub part_no: Option<String>,
    /// Name, when the catalog is not expanded.
    #[serde(default)]
    pub name: Option<String>,
    /// Quantity held.
    #[serde(default)]
    pub quantity: Option<f64>,
    /// Job the stock is reserved for.
    #[serde(default)]
    pub job: Option<Reference>,
}

impl StockResponse {
    /// Convert to a stock line. Lines without a catalog are dropped and a
    /// missing quantity reads as nothing on hand.
    #[must_use]
    pub fn into_stock_line(self) -> Option<StockLine> {
        let catalog = self.catalog?;
        let record = catalog.record().cloned().unwrap_or_default();
        Some(StockLine {
            stock_id: self.id.or(self.stock_id),
            catalog_id: CatalogId::new(catalog.id()),
            part_no: record.part_no.or(self.part_no).unwrap_or_default(),
            description: record
                .name
                .or(self.name)
                .unwrap_or_else(|| UNKNOWN_ITEM.to_string()),
            quantity: self.quantity.map_or(0, whole_units),
            job_id: self.job.as_ref().map(Reference::id),
            job_name: self
                .job
                .as_ref()
                .and_then(Reference::record)
                .and_then(|r| r.name.clone()),
        })
    }
}

/// Stock transfer body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StockTransferBody {
    /// Source device id.
    pub from_storage_device: u64,
    /// Destination device id.
    pub to_storage_device: u64,
    /// Lines to move.
    pub items: Vec<StockTransferItem>,
}

/// One line of a stock transfer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StockTransferItem {
    /// Catalog id.
    pub catalog: u64,
    /// Quantity.
    pub quantity: u32,
}

impl From<&StockTransferRequest> for StockTransferBody {
    fn from(request: &StockTransferRequest) -> Self {
        Self {
            from_storage_device: request.from.get(),
            to_storage_device: request.to.get(),
            items: request
                .lines
                .iter()
                .map(|line| StockTransferItem {
                    catalog: line.catalog_id.get(),
                    quantity: line.quantity,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::TransferLine;

    #[test]
    fn receipt_with_expanded_allocation() {
        let json = r#"{
            "ID": 11,
            "Catalogs": [
                {"Catalog": {"ID": 55, "PartNo": "CT-100"},
                 "Allocations": [
                    {"StorageDevice": {"ID": 3, "Name": "Stock Holding"}, "Quantity": 0},
                    {"StorageDevice": {"ID": 7, "Name": "Van 7"}, "Quantity": 4.0}
                 ]},
                {"Catalog": 56}
            ]
        }"#;

        let receipt: ReceiptDetail = serde_json::from_str::<ReceiptResponse>(json).unwrap().into();

        assert_eq!(receipt.receipt_id, ReceiptId::new(11));
        assert_eq!(receipt.items_received, None);
        let first = receipt.catalogs[0].allocation.as_ref().unwrap();
        assert_eq!(first.storage_device_id, StorageDeviceId::new(7));
        assert_eq!(first.storage_device_name, "Van 7");
        assert_eq!(first.quantity, 4);
        assert_eq!(receipt.catalogs[1].catalog_id, CatalogId::new(56));
        assert!(receipt.catalogs[1].allocation.is_none());
    }

    #[test]
    fn stock_line_accepts_bare_catalog_id() {
        let json = r#"[
            {"ID": 1, "Catalog": {"ID": 55, "PartNo": "CT-100", "Name": "Cable tray"}, "Quantity": 2.6},
            {"StockID": 2, "Catalog": 56, "PartNo": "GL-1", "Name": "Gland", "Job": {"ID": 9, "Name": "Fitout"}},
            {"ID": 3, "Quantity": 4}
        ]"#;

        let lines: Vec<StockLine> = serde_json::from_str::<Vec<StockResponse>>(json)
            .unwrap()
            .into_iter()
            .filter_map(StockResponse::into_stock_line)
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].description, "Cable tray");
        assert_eq!(lines[1].stock_id, Some(2));
        assert_eq!(lines[1].part_no, "GL-1");
        assert_eq!(lines[1].quantity, 0);
        assert_eq!(lines[1].job_name.as_deref(), Some("Fitout"));
    }

    #[test]
    fn fractional_quantities_round_down() {
        assert_eq!(whole_units(2.6), 2);
        assert_eq!(whole_units(0.9), 0);
        assert_eq!(whole_units(4.0), 4);
        assert_eq!(whole_units(-1.5), 0);
        assert_eq!(whole_units(f64::NAN), 0);
    }

    #[test]
    fn order_line_falls_back_to_description() {
        let json = r#"{"Catalog": {"ID": 5}, "Description": "Bracket", "Quantity": 4, "QuantityReceived": 1}"#;

        let line: PurchaseOrderLine = serde_json::from_str::<VendorOrderCatalogResponse>(json)
            .unwrap()
            .into();

        assert_eq!(line.description, "Bracket");
        assert_eq!(line.quantity_ordered, 4);
        assert_eq!(line.quantity_received, 1);
    }

    #[test]
    fn transfer_body_shape() {
        let request = StockTransferRequest::new(
            StorageDeviceId::new(3),
            StorageDeviceId::new(7),
            vec![TransferLine {
                catalog_id: CatalogId::new(55),
                quantity: 4,
            }],
        );

        let body = serde_json::to_value(StockTransferBody::from(&request)).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "FromStorageDevice": 3,
                "ToStorageDevice": 7,
                "Items": [{"Catalog": 55, "Quantity": 4}]
            })
        );
    }
}
