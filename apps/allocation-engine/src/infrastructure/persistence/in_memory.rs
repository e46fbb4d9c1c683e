//! In-memory allocation log.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::application::ports::{
    AllocationLogEntry, AllocationLogError, AllocationLogPort, ErrorLogEntry,
};

/// In-memory implementation of `AllocationLogPort`.
///
/// Keeps every entry for the life of the process. Backs the service when no
/// external audit store is configured, and the tests.
#[derive(Debug, Default)]
pub struct InMemoryAllocationLog {
    allocations: RwLock<Vec<AllocationLogEntry>>,
    errors: RwLock<Vec<ErrorLogEntry>>,
}

impl InMemoryAllocationLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocation entries written so far, oldest first.
    #[must_use]
    pub fn allocations(&self) -> Vec<AllocationLogEntry> {
        self.allocations
            .read()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Error entries written so far, oldest first.
    #[must_use]
    pub fn errors(&self) -> Vec<ErrorLogEntry> {
        self.errors
            .read()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Most recent allocation entries, newest first.
    #[must_use]
    pub fn recent_allocations(&self, limit: usize) -> Vec<AllocationLogEntry> {
        self.allocations
            .read()
            .map(|entries| entries.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }
}

fn poisoned<T>(_: T) -> AllocationLogError {
    AllocationLogError::WriteFailed {
        message: "allocation log lock poisoned".to_string(),
    }
}

#[async_trait]
impl AllocationLogPort for InMemoryAllocationLog {
    async fn log_allocation(&self, entry: AllocationLogEntry) -> Result<(), AllocationLogError> {
        self.allocations.write().map_err(poisoned)?.push(entry);
        Ok(())
    }

    async fn log_error(&self, entry: ErrorLogEntry) -> Result<(), AllocationLogError> {
        self.errors.write().map_err(poisoned)?.push(entry);
        Ok(())
    }
}
