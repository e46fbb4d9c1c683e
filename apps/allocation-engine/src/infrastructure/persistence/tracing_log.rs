//! Allocation log that writes structured `tracing` events.
//!
//! Lets log shippers pick the audit trail out of the service's own output
//! under the `allocation_audit` target.

use async_trait::async_trait;

use crate::application::ports::{
    AllocationLogEntry, AllocationLogError, AllocationLogPort, ErrorLogEntry,
};

/// `AllocationLogPort` backed by `tracing`, optionally forwarding to another log.
#[derive(Debug, Default)]
pub struct TracingAllocationLog<L = crate::application::ports::NoOpAllocationLog> {
    inner: L,
}

impl TracingAllocationLog {
    /// Create a log that only emits events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: AllocationLogPort> TracingAllocationLog<L> {
    /// Emit events and forward every entry to `inner`.
    #[must_use]
    pub const fn wrapping(inner: L) -> Self {
        Self { inner }
    }

    /// The wrapped log.
    #[must_use]
    pub const fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: AllocationLogPort> AllocationLogPort for TracingAllocationLog<L> {
    async fn log_allocation(&self, entry: AllocationLogEntry) -> Result<(), AllocationLogError> {
        tracing::info!(
            target: "allocation_audit",
            staff_id = ?entry.staff_id.map(|id| id.get()),
            staff_name = %entry.staff_name,
            po_number = %entry.po_number,
            job_number = %entry.job_number,
            vendor_name = %entry.vendor_name,
            items_count = entry.items_count,
            storage_location = %entry.storage_location,
            allocation_type = entry.allocation_type.as_str(),
            verified = entry.verified,
            "Allocation recorded"
        );
        self.inner.log_allocation(entry).await
    }

    async fn log_error(&self, entry: ErrorLogEntry) -> Result<(), AllocationLogError> {
        tracing::warn!(
            target: "allocation_audit",
            error_type = entry.error_type.as_str(),
            po_number = %entry.po_number,
            catalog_id = ?entry.catalog_id.map(|id| id.get()),
            staff_user = %entry.staff_user,
            error_code = %entry.error_code,
            error_message = %entry.error_message,
            request_payload = entry.request_payload.as_deref().unwrap_or(""),
            response_body = entry.response_body.as_deref().unwrap_or(""),
            endpoint = entry.endpoint.as_deref().unwrap_or(""),
            "Remote write failed"
        );
        self.inner.log_error(entry).await
    }
}
