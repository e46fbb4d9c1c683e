//! Relocation DTOs

use serde::{Deserialize, Serialize};

use super::allocation_dto::text_or_number;
use crate::domain::allocation::{
    AllocationOutcome, AllocationResult, AllocationTarget, RelocationCommand, RelocationItem,
    StaffIdentity,
};
use crate::domain::shared::{CatalogId, StorageDeviceId};

const fn default_quantity() -> i64 {
    1
}

/// One stock line to move, as listed by the storage stock endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocateItemDto {
    /// ERP stock record id, echoed from the stock listing.
    #[serde(default)]
    pub stock_id: Option<u64>,
    /// Catalog id.
    pub catalog_id: CatalogId,
    /// Quantity to move. Defaults to 1.
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    /// Supplier part number.
    #[serde(default, deserialize_with = "text_or_number")]
    pub part_no: String,
    /// Description.
    #[serde(default, deserialize_with = "text_or_number")]
    pub description: String,
    /// Job the stock is reserved for.
    #[serde(default)]
    pub job_id: Option<u64>,
}

impl RelocateItemDto {
    fn to_item(&self) -> RelocationItem {
        let mut item = RelocationItem::new(
            self.catalog_id,
            u32::try_from(self.quantity.max(0)).unwrap_or(u32::MAX),
        );
        item.part_no.clone_from(&self.part_no);
        item.description.clone_from(&self.description);
        item.job_id = self.job_id;
        item
    }
}

/// Request body of `POST /api/relocate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocateRequestDto {
    /// Device the stock is in now.
    pub source_id: StorageDeviceId,
    /// Display name of the source.
    #[serde(default, deserialize_with = "text_or_number")]
    pub source_name: String,
    /// Device the stock should end up in.
    pub dest_id: StorageDeviceId,
    /// Display name of the destination.
    #[serde(default, deserialize_with = "text_or_number")]
    pub dest_name: String,
    /// Lines to move.
    #[serde(default)]
    pub items: Vec<RelocateItemDto>,
}

fn display_name(name: &str, id: StorageDeviceId) -> String {
    if name.is_empty() {
        format!("Storage {id}")
    } else {
        name.to_string()
    }
}

impl RelocateRequestDto {
    /// Convert to the command the relocation use case runs.
    #[must_use]
    pub fn to_command(&self, staff: StaffIdentity) -> RelocationCommand {
        RelocationCommand::new(
            AllocationTarget::new(self.source_id, display_name(&self.source_name, self.source_id)),
            AllocationTarget::new(self.dest_id, display_name(&self.dest_name, self.dest_id)),
        )
        .with_items(self.items.iter().map(RelocateItemDto::to_item).collect())
        .with_staff(staff)
    }
}

/// Response body of `POST /api/relocate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocateResponseDto {
    /// True when at least one line moved.
    pub success: bool,
    /// Summary for the operator.
    pub message: String,
    /// Per-catalog results, in request order.
    pub results: Vec<AllocationResult>,
    /// Number of lines moved.
    pub success_count: usize,
    /// Number of catalogs in the request.
    pub total_items: usize,
    /// Staff member who moved the stock.
    pub relocated_by: String,
    /// Summary of failures when nothing moved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelocateResponseDto {
    /// Build the response from a relocation outcome.
    #[must_use]
    pub fn from_outcome(
        outcome: AllocationOutcome,
        source_name: &str,
        dest_name: &str,
        relocated_by: impl Into<String>,
    ) -> Self {
        let success_count = outcome.success_count();
        Self {
            success: success_count > 0,
            message: format!(
                "Moved {success_count} item(s) from {source_name} to {dest_name}"
            ),
            success_count,
            total_items: outcome.results.len(),
            relocated_by: relocated_by.into(),
            error: outcome.error_summary(),
            results: outcome.results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::allocation::AllocationMethod;

    #[test]
    fn parses_browser_request() {
        let body = r#"{
            "sourceId": 4,
            "sourceName": "Van 4",
            "destId": "9",
            "items": [
                {"stockId": 120, "catalogId": 55, "quantity": 3, "partNo": "CT-100",
                 "description": "Cable tray", "jobId": 310},
                {"catalogId": 56, "partNo": 4411, "jobId": null}
            ]
        }"#;

        let dto: RelocateRequestDto = serde_json::from_str(body).unwrap();
        let command = dto.to_command(StaffIdentity::new(None, "Sam"));

        assert_eq!(command.source.storage_device_id, StorageDeviceId::new(4));
        assert_eq!(command.destination.storage_device_name, "Storage 9");
        assert_eq!(command.items.len(), 2);
        assert_eq!(command.items[0].quantity, 3);
        assert_eq!(command.items[0].job_id, Some(310));
        assert_eq!(command.items[1].quantity, 1);
        assert_eq!(command.items[1].part_no, "4411");
        assert!(command.validate().is_ok());
    }

    #[test]
    fn negative_quantity_fails_validation() {
        let dto: RelocateRequestDto = serde_json::from_str(
            r#"{"sourceId": 4, "destId": 9, "items": [{"catalogId": 1, "quantity": -2}]}"#,
        )
        .unwrap();

        assert!(dto.to_command(StaffIdentity::unknown()).validate().is_err());
    }

    #[test]
    fn response_reports_moves() {
        let outcome = AllocationOutcome {
            results: vec![
                AllocationResult::verified(CatalogId::new(1), 2, AllocationMethod::StockTransfer),
                AllocationResult::failed(
                    CatalogId::new(2),
                    1,
                    AllocationMethod::SkippedZeroStock,
                    "No stock",
                ),
            ],
            goods_received_set: false,
        };

        let response = RelocateResponseDto::from_outcome(outcome, "Van 4", "Shelf A1", "Sam");

        assert!(response.success);
        assert_eq!(response.success_count, 1);
        assert_eq!(response.total_items, 2);
        assert_eq!(response.message, "Moved 1 item(s) from Van 4 to Shelf A1");
        assert!(response.error.is_none());
    }
}
