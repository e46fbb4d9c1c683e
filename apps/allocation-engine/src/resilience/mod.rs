//! Resilience patterns for remote calls.
//!
//! Polling schedules for reads against the eventually-consistent ERP.

mod poll;

pub use poll::{PollBackoff, PollPolicy};
