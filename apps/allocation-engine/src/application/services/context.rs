//! Per-request context shared by the allocation strategies.

use chrono::Utc;

use crate::application::ports::{AllocationLogPort, ErrorLogEntry, ErrorLogKind, RemoteError};
use crate::domain::allocation::{AllocationCommand, StaffIdentity};
use crate::domain::shared::{CatalogId, PoId};

/// Identifies the request a remote write belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationContext {
    /// ERP id of the purchase order.
    pub po_id: PoId,
    /// PO number shown to staff.
    pub po_number: String,
    /// Staff member performing the allocation.
    pub staff: StaffIdentity,
}

impl AllocationContext {
    /// Create a context.
    #[must_use]
    pub fn new(po_id: PoId, po_number: impl Into<String>, staff: StaffIdentity) -> Self {
        Self {
            po_id,
            po_number: po_number.into(),
            staff,
        }
    }

    /// Context of a relocation, which belongs to no purchase order.
    #[must_use]
    pub fn relocation(staff: StaffIdentity) -> Self {
        Self::new(PoId::default(), String::new(), staff)
    }

    /// Context of an allocation command.
    #[must_use]
    pub fn from_command(command: &AllocationCommand) -> Self {
        Self::new(command.po_id, command.po_number.clone(), command.staff.clone())
    }

    /// Build the error log entry for a failed remote write.
    #[must_use]
    pub fn error_entry(
        &self,
        kind: ErrorLogKind,
        catalog_id: Option<CatalogId>,
        error: &RemoteError,
    ) -> ErrorLogEntry {
        ErrorLogEntry {
            error_type: kind,
            po_number: self.po_number.clone(),
            catalog_id,
            staff_user: self.staff.display_name.clone(),
            error_code: error
                .status()
                .map_or_else(|| error.kind().to_string(), |s| s.to_string()),
            error_message: error.to_string(),
            request_payload: error.request_payload().map(str::to_string),
            response_body: error.response_body().map(str::to_string),
            endpoint: error.endpoint().map(str::to_string),
            created_at: Utc::now(),
        }
    }

    /// Write a failed remote write to the error log. Log failures are only traced.
    pub async fn record_failure<L>(
        &self,
        log: &L,
        kind: ErrorLogKind,
        catalog_id: Option<CatalogId>,
        error: &RemoteError,
    ) where
        L: AllocationLogPort + ?Sized,
    {
        let entry = self.error_entry(kind, catalog_id, error);
        if let Err(e) = log.log_error(entry).await {
            tracing::warn!(
                po_number = %self.po_number,
                error_type = kind.as_str(),
                error = %e,
                "Failed to write error log entry"
            );
        }
    }
}
