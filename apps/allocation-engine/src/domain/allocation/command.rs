//! The allocation request as the router receives it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::errors::AllocationRequestError;
use super::line_item::LineItem;
use crate::domain::shared::{PoId, StaffId, StorageDeviceId};

/// Storage device the caller wants the stock placed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationTarget {
    /// Destination storage device.
    pub storage_device_id: StorageDeviceId,
    /// Display name of the destination.
    pub storage_device_name: String,
}

impl AllocationTarget {
    /// Create a target.
    #[must_use]
    pub fn new(storage_device_id: StorageDeviceId, storage_device_name: impl Into<String>) -> Self {
        Self {
            storage_device_id,
            storage_device_name: storage_device_name.into(),
        }
    }
}

/// Authenticated staff member, supplied by the session layer. Used for audit only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffIdentity {
    /// Staff id, when the session layer knows it.
    pub staff_id: Option<StaffId>,
    /// Display name.
    pub display_name: String,
}

impl StaffIdentity {
    /// Create a staff identity.
    #[must_use]
    pub fn new(staff_id: Option<StaffId>, display_name: impl Into<String>) -> Self {
        Self {
            staff_id,
            display_name: display_name.into(),
        }
    }

    /// Identity used when the session layer supplied none.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(None, "Unknown")
    }
}

/// Command to allocate a set of PO lines into one storage device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationCommand {
    /// ERP id of the purchase order.
    pub po_id: PoId,
    /// PO number shown to staff (falls back to the id).
    pub po_number: String,
    /// Job the PO belongs to, if any.
    pub job_number: String,
    /// Vendor name.
    pub vendor_name: String,
    /// Destination storage device.
    pub target: AllocationTarget,
    /// Lines to allocate.
    pub items: Vec<LineItem>,
    /// Staff member performing the allocation.
    pub staff: StaffIdentity,
}

impl AllocationCommand {
    /// Create a command with no lines; add them with [`Self::with_items`].
    #[must_use]
    pub fn new(po_id: PoId, target: AllocationTarget) -> Self {
        Self {
            po_id,
            po_number: po_id.to_string(),
            job_number: String::new(),
            vendor_name: String::new(),
            target,
            items: Vec::new(),
            staff: StaffIdentity::unknown(),
        }
    }

    /// Set the lines to allocate.
    #[must_use]
    pub fn with_items(mut self, items: Vec<LineItem>) -> Self {
        self.items = items;
        self
    }

    /// Set the staff member.
    #[must_use]
    pub fn with_staff(mut self, staff: StaffIdentity) -> Self {
        self.staff = staff;
        self
    }

    /// Check the command can be routed: at least one line, each catalog once.
    pub fn validate(&self) -> Result<(), AllocationRequestError> {
        if self.items.is_empty() {
            return Err(AllocationRequestError::NoItems);
        }
        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.insert(item.catalog_id) {
                return Err(AllocationRequestError::DuplicateCatalog {
                    catalog_id: item.catalog_id,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::CatalogId;

    fn command(items: Vec<LineItem>) -> AllocationCommand {
        AllocationCommand::new(
            PoId::new(100),
            AllocationTarget::new(StorageDeviceId::new(5), "Bay 5"),
        )
        .with_items(items)
    }

    #[test]
    fn po_number_defaults_to_id() {
        assert_eq!(command(vec![]).po_number, "100");
    }

    #[test]
    fn empty_command_rejected() {
        assert_eq!(command(vec![]).validate(), Err(AllocationRequestError::NoItems));
    }

    #[test]
    fn duplicate_catalog_rejected() {
        let items = vec![
            LineItem::new(CatalogId::new(1), 1),
            LineItem::new(CatalogId::new(2), 1),
            LineItem::new(CatalogId::new(1), 3),
        ];
        assert_eq!(
            command(items).validate(),
            Err(AllocationRequestError::DuplicateCatalog {
                catalog_id: CatalogId::new(1)
            })
        );
    }

    #[test]
    fn distinct_catalogs_accepted() {
        let items = vec![
            LineItem::new(CatalogId::new(1), 1),
            LineItem::new(CatalogId::new(2), 1),
        ];
        assert!(command(items).validate().is_ok());
    }
}
