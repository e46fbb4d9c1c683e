//! Snapshot of a purchase order's receipting state.
//!
//! Rebuilt from the ERP on every allocation request: an external receipting
//! tool may change receipts between requests, so nothing here is cached.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::shared::{CatalogId, ReceiptId, StorageDeviceId};

/// Where a catalog's stock currently sits according to its receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAllocation {
    /// Storage device holding the stock.
    pub storage_device_id: StorageDeviceId,
    /// Display name of the storage device.
    pub storage_device_name: String,
    /// Quantity allocated to the device.
    pub quantity: u32,
}

/// A receipt of the PO and its items-received flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptSummary {
    /// Receipt id.
    pub receipt_id: ReceiptId,
    /// Whether the ERP has moved the receipt's stock to "in stock".
    pub items_received: bool,
}

/// Receipt-derived facts about one catalog line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogReceipt {
    /// Receipt the catalog was last seen on.
    pub receipt_id: ReceiptId,
    /// Items-received flag of that receipt.
    pub items_received: bool,
    /// Current storage allocation, when the receipt records one.
    pub allocation: Option<CurrentAllocation>,
}

/// Per-PO receipting snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiptState {
    receipts: Vec<ReceiptSummary>,
    catalogs: HashMap<CatalogId, CatalogReceipt>,
}

impl ReceiptState {
    /// State of a PO with no receipts.
    #[must_use]
    pub fn not_receipted() -> Self {
        Self::default()
    }

    /// True when at least one receipt exists, whatever its flag says.
    #[must_use]
    pub fn receipt_exists(&self) -> bool {
        !self.receipts.is_empty()
    }

    /// All receipts of the PO.
    #[must_use]
    pub fn receipts(&self) -> &[ReceiptSummary] {
        &self.receipts
    }

    /// Receipt facts for a catalog, if any receipt lists it.
    #[must_use]
    pub fn catalog(&self, catalog_id: CatalogId) -> Option<&CatalogReceipt> {
        self.catalogs.get(&catalog_id)
    }

    /// Receipts whose items-received flag is not yet set.
    #[must_use]
    pub fn unflagged_receipts(&self) -> Vec<ReceiptId> {
        self.receipts
            .iter()
            .filter(|r| !r.items_received)
            .map(|r| r.receipt_id)
            .collect()
    }

    /// Record a receipt. Re-recording an id replaces its flag.
    pub fn record_receipt(&mut self, receipt_id: ReceiptId, items_received: bool) {
        match self.receipts.iter_mut().find(|r| r.receipt_id == receipt_id) {
            Some(existing) => existing.items_received = items_received,
            None => self.receipts.push(ReceiptSummary {
                receipt_id,
                items_received,
            }),
        }
    }

    /// Record a catalog seen on a receipt. The last receipt recorded wins.
    ///
    /// Returns the flag of the receipt that was replaced when it disagrees
    /// with the new one, so callers can report the conflict.
    pub fn record_catalog(
        &mut self,
        catalog_id: CatalogId,
        receipt_id: ReceiptId,
        items_received: bool,
        allocation: Option<CurrentAllocation>,
    ) -> Option<bool> {
        let previous = self.catalogs.insert(
            catalog_id,
            CatalogReceipt {
                receipt_id,
                items_received,
                allocation,
            },
        );
        previous
            .filter(|p| p.receipt_id != receipt_id && p.items_received != items_received)
            .map(|p| p.items_received)
    }

    /// Mark a receipt's items as received after the flag was set remotely.
    pub fn mark_items_received(&mut self, receipt_id: ReceiptId) {
        self.record_receipt(receipt_id, true);
        for entry in self.catalogs.values_mut() {
            if entry.receipt_id == receipt_id {
                entry.items_received = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocation(device: u64) -> CurrentAllocation {
        CurrentAllocation {
            storage_device_id: StorageDeviceId::new(device),
            storage_device_name: format!("Shelf {device}"),
            quantity: 5,
        }
    }

    #[test]
    fn empty_state_is_not_receipted() {
        let state = ReceiptState::not_receipted();
        assert!(!state.receipt_exists());
        assert!(state.unflagged_receipts().is_empty());
    }

    #[test]
    fn unflagged_receipt_still_counts_as_receipted() {
        let mut state = ReceiptState::default();
        state.record_receipt(ReceiptId::new(1), false);
        assert!(state.receipt_exists());
        assert_eq!(state.unflagged_receipts(), vec![ReceiptId::new(1)]);
    }

    #[test]
    fn last_receipt_wins_and_reports_conflict() {
        let mut state = ReceiptState::default();
        let catalog = CatalogId::new(9);
        assert_eq!(
            state.record_catalog(catalog, ReceiptId::new(1), true, Some(allocation(3))),
            None
        );
        let conflict =
            state.record_catalog(catalog, ReceiptId::new(2), false, Some(allocation(4)));
        assert_eq!(conflict, Some(true));

        let entry = state.catalog(catalog).unwrap();
        assert_eq!(entry.receipt_id, ReceiptId::new(2));
        assert!(!entry.items_received);
        assert_eq!(
            entry.allocation.as_ref().unwrap().storage_device_id,
            StorageDeviceId::new(4)
        );
    }

    #[test]
    fn agreeing_receipts_report_no_conflict() {
        let mut state = ReceiptState::default();
        let catalog = CatalogId::new(9);
        state.record_catalog(catalog, ReceiptId::new(1), true, None);
        assert_eq!(state.record_catalog(catalog, ReceiptId::new(2), true, None), None);
    }

    #[test]
    fn marking_items_received_updates_receipt_and_catalogs() {
        let mut state = ReceiptState::default();
        state.record_receipt(ReceiptId::new(7), false);
        state.record_catalog(CatalogId::new(1), ReceiptId::new(7), false, Some(allocation(3)));

        state.mark_items_received(ReceiptId::new(7));

        assert!(state.unflagged_receipts().is_empty());
        assert!(state.catalog(CatalogId::new(1)).unwrap().items_received);
    }
}
