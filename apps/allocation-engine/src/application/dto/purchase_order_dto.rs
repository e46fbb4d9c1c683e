//! Purchase order lookup DTOs

use serde::{Deserialize, Serialize};

use crate::application::ports::{JobSummary, PurchaseOrderLine, PurchaseOrderSummary};
use crate::domain::allocation::ReceiptStatus;
use crate::domain::shared::{CatalogId, PoId};

/// Vendor shown when the ERP has none on the order.
pub const UNKNOWN_VENDOR: &str = "Unknown Vendor";

/// One line of a looked-up purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderItemDto {
    /// Catalog id of the line.
    pub catalog_id: CatalogId,
    /// Supplier part number.
    pub part_no: String,
    /// Line description.
    pub description: String,
    /// Quantity on the order.
    pub quantity_ordered: u32,
    /// Quantity already receipted.
    pub quantity_received: u32,
    /// Receipt status derived from the two quantities.
    pub receipt_status: ReceiptStatus,
}

impl From<PurchaseOrderLine> for PurchaseOrderItemDto {
    fn from(line: PurchaseOrderLine) -> Self {
        Self {
            receipt_status: ReceiptStatus::from_quantities(
                line.quantity_ordered,
                line.quantity_received,
            ),
            catalog_id: line.catalog_id,
            part_no: line.part_no,
            description: line.description,
            quantity_ordered: line.quantity_ordered,
            quantity_received: line.quantity_received,
        }
    }
}

/// Response body of `GET /api/po/{po_number}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderDto {
    /// PO number as entered.
    pub po_number: String,
    /// ERP id of the order.
    pub po_id: PoId,
    /// Vendor company name.
    pub vendor_name: String,
    /// Job the order belongs to, empty when none.
    pub job_number: String,
    /// Job name, when the job could be read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    /// Customer of the job, empty when unknown.
    pub customer_name: String,
    /// Order stage.
    pub status: String,
    /// Order lines.
    pub items: Vec<PurchaseOrderItemDto>,
}

impl PurchaseOrderDto {
    /// Assemble the lookup response.
    #[must_use]
    pub fn new(
        po_number: impl Into<String>,
        order: PurchaseOrderSummary,
        job: Option<JobSummary>,
        lines: Vec<PurchaseOrderLine>,
    ) -> Self {
        let (job_name, customer_name) = job
            .map(|j| (j.name, j.customer_name.unwrap_or_default()))
            .unwrap_or_default();
        Self {
            po_number: po_number.into(),
            po_id: order.po_id,
            vendor_name: order
                .vendor_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNKNOWN_VENDOR.to_string()),
            job_number: order.job_id.map(|id| id.to_string()).unwrap_or_default(),
            job_name,
            customer_name,
            status: order.stage.unwrap_or_default(),
            items: lines.into_iter().map(PurchaseOrderItemDto::from).collect(),
        }
    }
}
