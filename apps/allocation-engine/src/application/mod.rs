//! Application Layer
//!
//! The application layer orchestrates domain logic through use cases.
//! It defines:
//!
//! - **Ports**: Interfaces to the ERP and the allocation audit log
//! - **Services**: Receipt inspection and the two placement strategies
//! - **Use Cases**: Allocation, PO lookup and stock listing
//! - **DTOs**: Data transfer objects for the HTTP API

pub mod dto;
pub mod ports;
pub mod services;
pub mod use_cases;

pub use dto::*;
pub use ports::*;
pub use use_cases::*;
