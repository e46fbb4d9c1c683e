//! Stock pick list DTOs

use serde::{Deserialize, Serialize};

use crate::application::ports::PurchaseOrderSummary;
use crate::domain::shared::PoId;

use super::purchase_order_dto::UNKNOWN_VENDOR;

/// One pending order whose job needs stock picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickListItemDto {
    /// Job the order is raised against.
    pub job_id: u64,
    /// ERP id of the order.
    pub order_id: PoId,
    /// Vendor company name.
    pub vendor: String,
}

/// Response body of `GET /api/stock-pick-list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickListDto {
    /// Orders to pick for.
    pub items: Vec<PickListItemDto>,
    /// Number of entries.
    pub count: usize,
}

impl PickListDto {
    /// Build the list from pending orders. Orders without a job are left out.
    #[must_use]
    pub fn from_orders(orders: impl IntoIterator<Item = PurchaseOrderSummary>) -> Self {
        let items: Vec<PickListItemDto> = orders
            .into_iter()
            .filter_map(|order| {
                Some(PickListItemDto {
                    job_id: order.job_id?,
                    order_id: order.po_id,
                    vendor: order
                        .vendor_name
                        .unwrap_or_else(|| UNKNOWN_VENDOR.to_string()),
                })
            })
            .collect();
        Self {
            count: items.len(),
            items,
        }
    }
}
