//! simPRO Inventory Adapter
//!
//! Implementation of `InventoryPort` for the simPRO REST API with:
//! - OAuth client-credentials tokens cached until shortly before expiry
//! - One forced refresh on 401 and one retry on transport failure
//! - Typed request and response bodies

mod adapter;
mod api_types;
mod config;
mod credentials;
mod error;
mod http_client;

pub use adapter::SimproInventoryAdapter;
pub use config::SimproConfig;
pub use credentials::{Clock, Credential, CredentialManager, SystemClock};
pub use error::SimproError;
pub use http_client::{RemoteResponse, SimproHttpClient};
