//! Per-line allocation results and the request-level outcome.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::shared::CatalogId;

/// Strategy that resolved a line item. Exactly one per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMethod {
    /// Allocation written on the order line before any receipt existed.
    PreReceiptAllocation,
    /// Stock moved between storage devices.
    StockTransfer,
    /// Stock already sits in the target device.
    AlreadyAllocated,
    /// Service charge line with no physical stock.
    SkippedService,
    /// Source device had no stock after polling.
    SkippedZeroStock,
    /// Source device stock could not be read.
    SkippedStockCheckFailed,
}

impl AllocationMethod {
    /// Get the wire name of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PreReceiptAllocation => "pre_receipt_allocation",
            Self::StockTransfer => "stock_transfer",
            Self::AlreadyAllocated => "already_allocated",
            Self::SkippedService => "skipped_service",
            Self::SkippedZeroStock => "skipped_zero_stock",
            Self::SkippedStockCheckFailed => "skipped_stock_check_failed",
        }
    }
}

impl fmt::Display for AllocationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result for one line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    /// Catalog id of the line.
    pub catalog_id: CatalogId,
    /// Whether the line ended up where the caller asked.
    pub success: bool,
    /// Quantity placed (or requested, for failures).
    pub quantity: u32,
    /// Whether a read-back confirmed the placement.
    pub verified: bool,
    /// Strategy that resolved the line.
    pub method: AllocationMethod,
    /// Note for the operator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AllocationResult {
    /// A successful, verified result.
    #[must_use]
    pub const fn verified(catalog_id: CatalogId, quantity: u32, method: AllocationMethod) -> Self {
        Self {
            catalog_id,
            success: true,
            quantity,
            verified: true,
            method,
            message: None,
            error: None,
        }
    }

    /// A successful result that no read-back confirmed.
    #[must_use]
    pub const fn unverified(catalog_id: CatalogId, quantity: u32, method: AllocationMethod) -> Self {
        Self {
            catalog_id,
            success: true,
            quantity,
            verified: false,
            method,
            message: None,
            error: None,
        }
    }

    /// A failed result.
    #[must_use]
    pub fn failed(
        catalog_id: CatalogId,
        quantity: u32,
        method: AllocationMethod,
        error: impl Into<String>,
    ) -> Self {
        Self {
            catalog_id,
            success: false,
            quantity,
            verified: false,
            method,
            message: None,
            error: Some(error.into()),
        }
    }

    /// A service line, resolved without touching the ERP. Nothing moves, so
    /// there is nothing left to verify.
    #[must_use]
    pub fn skipped_service(catalog_id: CatalogId, quantity: u32) -> Self {
        Self::verified(catalog_id, quantity, AllocationMethod::SkippedService)
            .with_message("Service line, no physical stock to allocate")
    }

    /// Attach an operator message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Allocation type recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationType {
    /// Only pre-receipt writes succeeded.
    PreReceipt,
    /// Only stock transfers succeeded.
    StockTransfer,
    /// Both strategies moved stock.
    Mixed,
    /// Nothing moved (already allocated, skipped or failed).
    NoMovement,
    /// Stock moved between two devices outside any purchase order.
    Relocation,
}

impl AllocationType {
    /// Get the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PreReceipt => "pre_receipt",
            Self::StockTransfer => "stock_transfer",
            Self::Mixed => "mixed",
            Self::NoMovement => "no_movement",
            Self::Relocation => "relocation",
        }
    }
}

impl fmt::Display for AllocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an allocation request: one result per input line, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationOutcome {
    /// Per-line results.
    pub results: Vec<AllocationResult>,
    /// Whether the PO status was moved to goods received.
    pub goods_received_set: bool,
}

impl AllocationOutcome {
    /// Number of successful results across all methods.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Number of successful results with the given method.
    #[must_use]
    pub fn count_by(&self, method: AllocationMethod) -> usize {
        self.results
            .iter()
            .filter(|r| r.success && r.method == method)
            .count()
    }

    /// True when something succeeded and every success was verified.
    #[must_use]
    pub fn all_verified(&self) -> bool {
        self.success_count() > 0 && self.results.iter().filter(|r| r.success).all(|r| r.verified)
    }

    /// Distinct error messages joined for display, only when nothing succeeded.
    #[must_use]
    pub fn error_summary(&self) -> Option<String> {
        if self.success_count() > 0 {
            return None;
        }
        let mut messages: Vec<&str> = Vec::new();
        for error in self.results.iter().filter_map(|r| r.error.as_deref()) {
            if !messages.contains(&error) {
                messages.push(error);
            }
        }
        if messages.is_empty() {
            Some("No items were allocated".to_string())
        } else {
            Some(messages.join("; "))
        }
    }

    /// Allocation type for the audit log.
    #[must_use]
    pub fn allocation_type(&self) -> AllocationType {
        let pre = self.count_by(AllocationMethod::PreReceiptAllocation) > 0;
        let transfer = self.count_by(AllocationMethod::StockTransfer) > 0;
        match (pre, transfer) {
            (true, true) => AllocationType::Mixed,
            (true, false) => AllocationType::PreReceipt,
            (false, true) => AllocationType::StockTransfer,
            (false, false) => AllocationType::NoMovement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(id: u64) -> CatalogId {
        CatalogId::new(id)
    }

    #[test]
    fn method_serializes_snake_case() {
        let json = serde_json::to_string(&AllocationMethod::SkippedStockCheckFailed).unwrap();
        assert_eq!(json, "\"skipped_stock_check_failed\"");
    }

    #[test]
    fn result_serializes_camel_case_without_empty_fields() {
        let result = AllocationResult::verified(cat(4), 2, AllocationMethod::StockTransfer);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["catalogId"], 4);
        assert_eq!(json["method"], "stock_transfer");
        assert!(json.get("error").is_none());
        assert!(json.get("message").is_none());
    }

    #[test]
    fn counts_and_type_for_mixed_outcome() {
        let outcome = AllocationOutcome {
            results: vec![
                AllocationResult::verified(cat(1), 1, AllocationMethod::PreReceiptAllocation),
                AllocationResult::verified(cat(2), 1, AllocationMethod::StockTransfer),
                AllocationResult::failed(cat(3), 1, AllocationMethod::SkippedZeroStock, "none"),
            ],
            goods_received_set: true,
        };
        assert_eq!(outcome.success_count(), 2);
        assert!(outcome.all_verified());
        assert_eq!(outcome.allocation_type(), AllocationType::Mixed);
        assert_eq!(outcome.error_summary(), None);
    }

    #[test]
    fn unverified_success_clears_all_verified() {
        let outcome = AllocationOutcome {
            results: vec![
                AllocationResult::verified(cat(1), 1, AllocationMethod::AlreadyAllocated),
                AllocationResult::unverified(cat(2), 1, AllocationMethod::PreReceiptAllocation),
            ],
            goods_received_set: false,
        };
        assert!(!outcome.all_verified());
        assert_eq!(outcome.allocation_type(), AllocationType::PreReceipt);
    }

    #[test]
    fn service_line_keeps_all_verified() {
        let outcome = AllocationOutcome {
            results: vec![
                AllocationResult::verified(cat(1), 2, AllocationMethod::PreReceiptAllocation),
                AllocationResult::skipped_service(cat(2), 1),
            ],
            goods_received_set: true,
        };
        assert!(outcome.results[1].verified);
        assert!(outcome.all_verified());
        assert_eq!(outcome.allocation_type(), AllocationType::PreReceipt);
    }

    #[test]
    fn error_summary_joins_distinct_messages() {
        let outcome = AllocationOutcome {
            results: vec![
                AllocationResult::failed(cat(1), 1, AllocationMethod::StockTransfer, "HTTP 422"),
                AllocationResult::failed(cat(2), 1, AllocationMethod::StockTransfer, "HTTP 422"),
                AllocationResult::failed(cat(3), 1, AllocationMethod::SkippedZeroStock, "No stock"),
            ],
            goods_received_set: false,
        };
        assert!(!outcome.all_verified());
        assert_eq!(outcome.error_summary().as_deref(), Some("HTTP 422; No stock"));
        assert_eq!(outcome.allocation_type(), AllocationType::NoMovement);
    }
}
