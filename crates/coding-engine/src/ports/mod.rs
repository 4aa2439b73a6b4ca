//! # Ports
//!
//! Inbound API trait and outbound dependency traits.

pub mod inbound;
pub mod outbound;

pub use inbound::CodingWorkflowApi;
pub use outbound::{
    BillingGateway, MockBillingGateway, Page, RecordStore, SequenceAllocator, TimeSource,
    VersionedRecord,
};
