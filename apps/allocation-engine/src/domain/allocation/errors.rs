//! Allocation domain errors.

use std::fmt;

use crate::domain::shared::{CatalogId, StorageDeviceId};

/// Reasons an allocation command cannot be routed at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationRequestError {
    /// The command carries no lines.
    NoItems,
    /// The same catalog appears twice; each line is processed once per request.
    DuplicateCatalog {
        /// The repeated catalog id.
        catalog_id: CatalogId,
    },
}

impl fmt::Display for AllocationRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoItems => write!(f, "No line items to allocate"),
            Self::DuplicateCatalog { catalog_id } => {
                write!(f, "Catalog {catalog_id} appears more than once in the request")
            }
        }
    }
}

impl std::error::Error for AllocationRequestError {}

/// Reasons a relocation command cannot run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationRequestError {
    /// Source or destination device is missing.
    MissingDevice,
    /// Source and destination are the same device.
    SameDevice {
        /// The device named twice.
        storage_device_id: StorageDeviceId,
    },
    /// The command carries no lines.
    NoItems,
    /// A line asks to move nothing.
    ZeroQuantity {
        /// Catalog of that line.
        catalog_id: CatalogId,
    },
}

impl fmt::Display for RelocationRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDevice => write!(f, "Source and destination storage devices are required"),
            Self::SameDevice { .. } => write!(f, "Source and destination cannot be the same"),
            Self::NoItems => write!(f, "No items to relocate"),
            Self::ZeroQuantity { catalog_id } => {
                write!(f, "Quantity for catalog {catalog_id} must be positive")
            }
        }
    }
}

impl std::error::Error for RelocationRequestError {}
