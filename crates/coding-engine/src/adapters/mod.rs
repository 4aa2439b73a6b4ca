//! # Adapters
//!
//! Concrete implementations of the outbound ports.

pub mod billing;
pub mod memory_store;
pub mod time;

pub use billing::InMemoryBillingGateway;
pub use memory_store::InMemoryRecordStore;
pub use time::{FixedTimeSource, SystemTimeSource};
