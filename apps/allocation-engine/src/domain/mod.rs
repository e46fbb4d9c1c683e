//! Domain Layer
//!
//! Pure allocation rules with no I/O. This layer defines:
//!
//! - **Value Objects**: Typed ERP identifiers, line items, requested quantities
//! - **Receipt State**: What the ERP says about a PO's receipts
//! - **Routing**: The decision of how each line reaches its target device
//! - **Results**: Per-line outcomes and their aggregation
//!
//! # Bounded Contexts
//!
//! - [`allocation`]: Line classification and allocation outcomes
//! - [`shared`]: Identifiers shared across contexts

pub mod allocation;
pub mod shared;
