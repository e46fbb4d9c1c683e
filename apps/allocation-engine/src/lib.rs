// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Allocation Engine - Rust Core Library
//!
//! Puts purchase-order lines away into storeroom storage devices in simPRO.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Line items, receipt state, routing decisions and results
//!   - `allocation`: `AllocationCommand`, `ItemRoute`, `AllocationResult`
//!   - `shared`: Typed identifiers
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: Interfaces for external systems (`InventoryPort`, `AllocationLogPort`)
//!   - `services`: Stock inspection, pre-receipt and stock-transfer strategies
//!   - `use_cases`: `AllocateItems`, `LookupPurchaseOrder`, `ListStorageStock`,
//!     `RelocateStock`, `StockPickList`
//!   - `dto`: Data transfer objects for API boundaries
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `simpro`: simPRO REST adapter with OAuth2 token cache
//!   - `http`: Axum REST controllers
//!   - `persistence`: Allocation log sinks
//!   - `inventory`: In-memory inventory for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// YAML configuration loading and validation.
pub mod config;

/// Request-level error taxonomy.
pub mod error;

/// Metrics and log output.
pub mod observability;

/// Polling schedules for remote reads.
pub mod resilience;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::allocation::{
    AllocationCommand, AllocationMethod, AllocationOutcome, AllocationResult, AllocationTarget,
    ItemRoute, LineItem, ReceiptState, RelocationCommand, RelocationItem, StaffIdentity,
};
pub use domain::shared::{CatalogId, PoId, ReceiptId, StaffId, StorageDeviceId};

// Application re-exports
pub use application::dto::{
    AllocateRequestDto, AllocateResponseDto, PickListDto, PurchaseOrderDto, RelocateRequestDto,
    RelocateResponseDto, StorageLocationDto,
};
pub use application::ports::{AllocationLogPort, InventoryPort, RemoteError};
pub use application::use_cases::{
    AllocateItemsUseCase, ListStorageStockUseCase, LookupPurchaseOrderUseCase,
    RelocateStockUseCase, RoutingConfig, StockPickListUseCase,
};

// Infrastructure re-exports
pub use infrastructure::http::{AppState, create_router};
pub use infrastructure::inventory::MockInventory;
pub use infrastructure::persistence::{InMemoryAllocationLog, TracingAllocationLog};
pub use infrastructure::simpro::{SimproConfig, SimproInventoryAdapter};

pub use config::{Config, ConfigError, load_config};
pub use error::{AllocationError, ErrorCode};
