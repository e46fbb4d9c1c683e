//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer:
//!
//! - **Driven Adapters (Outbound)**
//!   - `simpro/`: simPRO REST API adapter
//!   - `inventory/`: in-memory inventory for tests and local runs
//!   - `persistence/`: allocation log sinks
//!
//! - **Driver Adapters (Inbound)**
//!   - `http/`: REST API controllers

pub mod http;
pub mod inventory;
pub mod persistence;
pub mod simpro;
