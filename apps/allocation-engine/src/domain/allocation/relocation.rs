//! Moving stock that already sits in one storage device into another.

use super::command::{AllocationTarget, StaffIdentity};
use super::errors::RelocationRequestError;
use crate::domain::shared::CatalogId;

/// One stock line the caller wants moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationItem {
    /// Catalog id.
    pub catalog_id: CatalogId,
    /// Quantity to move.
    pub quantity: u32,
    /// Supplier part number, for the operator.
    pub part_no: String,
    /// Description, for the operator.
    pub description: String,
    /// Job the stock is reserved for.
    pub job_id: Option<u64>,
}

impl RelocationItem {
    /// Create an item.
    #[must_use]
    pub const fn new(catalog_id: CatalogId, quantity: u32) -> Self {
        Self {
            catalog_id,
            quantity,
            part_no: String::new(),
            description: String::new(),
            job_id: None,
        }
    }
}

/// Command to move stock lines from one storage device to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationCommand {
    /// Device the stock is in now.
    pub source: AllocationTarget,
    /// Device the stock should end up in.
    pub destination: AllocationTarget,
    /// Lines to move.
    pub items: Vec<RelocationItem>,
    /// Staff member moving the stock.
    pub staff: StaffIdentity,
}

impl RelocationCommand {
    /// Create a command with no lines.
    #[must_use]
    pub fn new(source: AllocationTarget, destination: AllocationTarget) -> Self {
        Self {
            source,
            destination,
            items: Vec::new(),
            staff: StaffIdentity::unknown(),
        }
    }

    /// Set the lines to move.
    #[must_use]
    pub fn with_items(mut self, items: Vec<RelocationItem>) -> Self {
        self.items = items;
        self
    }

    /// Set the staff member.
    #[must_use]
    pub fn with_staff(mut self, staff: StaffIdentity) -> Self {
        self.staff = staff;
        self
    }

    /// Check the command can run: both devices set and distinct, at least
    /// one line, every quantity positive.
    pub fn validate(&self) -> Result<(), RelocationRequestError> {
        let source = self.source.storage_device_id;
        let destination = self.destination.storage_device_id;
        if source.get() == 0 || destination.get() == 0 {
            return Err(RelocationRequestError::MissingDevice);
        }
        if source == destination {
            return Err(RelocationRequestError::SameDevice {
                storage_device_id: source,
            });
        }
        if self.items.is_empty() {
            return Err(RelocationRequestError::NoItems);
        }
        if let Some(item) = self.items.iter().find(|item| item.quantity == 0) {
            return Err(RelocationRequestError::ZeroQuantity {
                catalog_id: item.catalog_id,
            });
        }
        Ok(())
    }

    /// Lines with repeated catalogs folded into the first occurrence.
    ///
    /// A device can list one catalog several times (one per job it is held
    /// for) while a transfer moves quantities by catalog.
    #[must_use]
    pub fn merged_items(&self) -> Vec<RelocationItem> {
        let mut merged: Vec<RelocationItem> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            match merged.iter_mut().find(|m| m.catalog_id == item.catalog_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => merged.push(item.clone()),
            }
        }
        merged
    }
}
