//! Routing decision for a single line item.
//!
//! Each line lands in exactly one [`ItemRoute`] and each route maps to exactly
//! one strategy:
//!
//! | Route | Strategy |
//! |-------|----------|
//! | `NotReceipted` | pre-receipt allocation write |
//! | `ReceiptedKnownLocationMatchingTarget` | none (`already_allocated`) |
//! | `ReceiptedKnownLocationFlagged` | stock transfer from the current device |
//! | `ReceiptedKnownLocationUnflagged` | set items-received, settle, stock transfer |
//! | `ReceiptedUnknownLocation` | set items-received on open receipts, settle, stock transfer from stock holding |
//!
//! Once any receipt exists the pre-receipt write path is off limits: the ERP
//! books the allocation against the cost centre a second time.

use std::slice;

use super::line_item::{LineItem, ReceiptStatus};
use super::receipt_state::{CurrentAllocation, ReceiptState};
use crate::domain::shared::{ReceiptId, StorageDeviceId};

/// Handling path chosen for one line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRoute {
    /// No receipt exists; the allocation can still be set on the order line.
    NotReceipted,
    /// The line's stock already sits in the target device.
    ReceiptedKnownLocationMatchingTarget {
        /// Allocation found on the receipt.
        current: CurrentAllocation,
    },
    /// Receipted, in stock, at a known device other than the target.
    ReceiptedKnownLocationFlagged {
        /// Device to transfer from.
        source: StorageDeviceId,
    },
    /// Receipted but still in transit at a known device.
    ReceiptedKnownLocationUnflagged {
        /// Device to transfer from.
        source: StorageDeviceId,
        /// Receipt whose items-received flag must be set first.
        receipt_id: ReceiptId,
    },
    /// Receipted, but no receipt records where this line's stock is.
    ReceiptedUnknownLocation {
        /// Receipts whose items-received flag must be set first.
        unflagged_receipts: Vec<ReceiptId>,
    },
}

impl ItemRoute {
    /// Classify a line against the PO's receipt snapshot.
    #[must_use]
    pub fn classify(item: &LineItem, state: &ReceiptState, target: StorageDeviceId) -> Self {
        let entry = state.catalog(item.catalog_id);

        if let Some(current) = entry.and_then(|e| e.allocation.as_ref())
            && current.storage_device_id == target
        {
            return Self::ReceiptedKnownLocationMatchingTarget {
                current: current.clone(),
            };
        }

        let receipted =
            state.receipt_exists() || item.receipt_status == ReceiptStatus::FullyReceipted;
        if !receipted {
            return Self::NotReceipted;
        }

        match entry {
            Some(e) => match &e.allocation {
                Some(current) if e.items_received => Self::ReceiptedKnownLocationFlagged {
                    source: current.storage_device_id,
                },
                Some(current) => Self::ReceiptedKnownLocationUnflagged {
                    source: current.storage_device_id,
                    receipt_id: e.receipt_id,
                },
                None if e.items_received => Self::ReceiptedUnknownLocation {
                    unflagged_receipts: Vec::new(),
                },
                None => Self::ReceiptedUnknownLocation {
                    unflagged_receipts: vec![e.receipt_id],
                },
            },
            None => Self::ReceiptedUnknownLocation {
                unflagged_receipts: state.unflagged_receipts(),
            },
        }
    }

    /// Receipts whose items-received flag must be set before transferring.
    #[must_use]
    pub fn receipts_to_flag(&self) -> &[ReceiptId] {
        match self {
            Self::ReceiptedKnownLocationUnflagged { receipt_id, .. } => slice::from_ref(receipt_id),
            Self::ReceiptedUnknownLocation { unflagged_receipts } => unflagged_receipts,
            _ => &[],
        }
    }

    /// Device to transfer from, or `None` when the route does not transfer.
    #[must_use]
    pub const fn transfer_source(&self, stock_holding: StorageDeviceId) -> Option<StorageDeviceId> {
        match self {
            Self::ReceiptedKnownLocationFlagged { source }
            | Self::ReceiptedKnownLocationUnflagged { source, .. } => Some(*source),
            Self::ReceiptedUnknownLocation { .. } => Some(stock_holding),
            Self::NotReceipted | Self::ReceiptedKnownLocationMatchingTarget { .. } => None,
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NotReceipted => "not_receipted",
            Self::ReceiptedKnownLocationMatchingTarget { .. } => "known_location_matching_target",
            Self::ReceiptedKnownLocationFlagged { .. } => "known_location_flagged",
            Self::ReceiptedKnownLocationUnflagged { .. } => "known_location_unflagged",
            Self::ReceiptedUnknownLocation { .. } => "unknown_location",
        }
    }
}
