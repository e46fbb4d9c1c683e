//! Allocation DTOs

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::allocation::{
    AllocationCommand, AllocationMethod, AllocationOutcome, AllocationResult, AllocationTarget,
    LineItem, ReceiptStatus, StaffIdentity,
};
use crate::domain::shared::{CatalogId, PoId, StorageDeviceId};

/// Free-text field the browser sends either as a string or a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextRepr {
    Text(String),
    Number(serde_json::Number),
}

pub(super) fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<TextRepr>::deserialize(deserializer)? {
        Some(TextRepr::Text(text)) => text,
        Some(TextRepr::Number(number)) => number.to_string(),
        None => String::new(),
    })
}

/// One line of an allocation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateItemDto {
    /// Catalog id of the line.
    pub catalog_id: CatalogId,
    /// Quantity to allocate. Zero or negative falls back to the ordered quantity.
    #[serde(default)]
    pub quantity: i64,
    /// Quantity on the order.
    #[serde(default)]
    pub quantity_ordered: Option<u32>,
    /// Quantity already receipted.
    #[serde(default)]
    pub quantity_received: Option<u32>,
    /// Supplier part number.
    #[serde(default, deserialize_with = "text_or_number")]
    pub part_no: String,
    /// Line description.
    #[serde(default, deserialize_with = "text_or_number")]
    pub description: String,
    /// Receipt status shown to the operator.
    #[serde(default)]
    pub receipt_status: ReceiptStatus,
}

impl AllocateItemDto {
    /// Convert to a domain line item.
    #[must_use]
    pub fn to_line_item(&self) -> LineItem {
        let mut item = LineItem::new(self.catalog_id, self.quantity)
            .with_part(self.part_no.clone(), self.description.clone())
            .with_quantity_ordered(self.quantity_ordered.unwrap_or(0))
            .with_receipt_status(self.receipt_status);
        item.quantity_received = self.quantity_received.unwrap_or(0);
        item
    }
}

/// Request body of `POST /api/allocate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateRequestDto {
    /// ERP id of the purchase order.
    pub po_id: PoId,
    /// Lines to allocate.
    #[serde(default)]
    pub items: Vec<AllocateItemDto>,
    /// Destination storage device.
    pub storage_device_id: StorageDeviceId,
    /// Display name of the destination.
    #[serde(default, deserialize_with = "text_or_number")]
    pub storage_name: String,
    /// PO number shown to staff.
    #[serde(default, deserialize_with = "text_or_number")]
    pub po_number: String,
    /// Job number.
    #[serde(default, deserialize_with = "text_or_number")]
    pub job_number: String,
    /// Vendor name.
    #[serde(default, deserialize_with = "text_or_number")]
    pub vendor_name: String,
}

impl AllocateRequestDto {
    /// Convert to the command the allocation use case runs.
    #[must_use]
    pub fn to_command(&self, staff: StaffIdentity) -> AllocationCommand {
        let storage_name = if self.storage_name.is_empty() {
            format!("Storage {}", self.storage_device_id)
        } else {
            self.storage_name.clone()
        };
        let mut command = AllocationCommand::new(
            self.po_id,
            AllocationTarget::new(self.storage_device_id, storage_name),
        )
        .with_items(self.items.iter().map(AllocateItemDto::to_line_item).collect())
        .with_staff(staff);
        if !self.po_number.is_empty() {
            command.po_number.clone_from(&self.po_number);
        }
        command.job_number.clone_from(&self.job_number);
        command.vendor_name.clone_from(&self.vendor_name);
        command
    }
}

/// Response body of `POST /api/allocate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateResponseDto {
    /// True when at least one line succeeded.
    pub success: bool,
    /// Per-line results, in request order.
    pub results: Vec<AllocationResult>,
    /// Number of successful lines.
    pub success_count: usize,
    /// Number of lines in the request.
    pub total_items: usize,
    /// True when every successful line was confirmed by a read-back.
    pub all_verified: bool,
    /// Whether the PO was moved to goods received.
    pub goods_received_set: bool,
    /// Successful pre-receipt allocations.
    pub pre_receipt_count: usize,
    /// Successful stock transfers.
    pub stock_transfer_count: usize,
    /// Staff member who ran the allocation.
    pub allocated_by: String,
    /// Summary of failures when nothing succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AllocateResponseDto {
    /// Build the response from an allocation outcome.
    #[must_use]
    pub fn from_outcome(outcome: AllocationOutcome, allocated_by: impl Into<String>) -> Self {
        let success_count = outcome.success_count();
        Self {
            success: success_count > 0,
            success_count,
            total_items: outcome.results.len(),
            all_verified: outcome.all_verified(),
            goods_received_set: outcome.goods_received_set,
            pre_receipt_count: outcome.count_by(AllocationMethod::PreReceiptAllocation),
            stock_transfer_count: outcome.count_by(AllocationMethod::StockTransfer),
            allocated_by: allocated_by.into(),
            error: outcome.error_summary(),
            results: outcome.results,
        }
    }
}
