//! Persistence Adapters
//!
//! Implementations of the allocation audit log.

pub mod in_memory;
pub mod tracing_log;

pub use in_memory::InMemoryAllocationLog;
pub use tracing_log::TracingAllocationLog;
