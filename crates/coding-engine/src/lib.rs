//! # Clinical Coding & Claims-Lifecycle Engine
//!
//! Tracks one patient encounter's procedure/diagnosis coding record from
//! creation through coder review, query resolution, return/resubmission
//! cycles, approval, submission and billing sync.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Workflow
//!
//! ```text
//! awaiting_coding ──assign_codes──→ coded ──submit_for_review──→ under_review
//!        ▲                           │  ▲                            │
//!        │              raise_query  │  │ answer_query    approve /  │ return
//!        │                           ▼  │                            ▼
//!     (create)                     queried              approved   returned
//!                                                          │           │
//!                                              submit_to_billing   resubmit
//!                                                          │           │
//!                                                          ▼           ▼
//!                                   closed ◀──sync_bill── submitted  resubmitted
//!                                                                      │
//!                                                            submit_for_review
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! coding-engine/
//! ├── domain/          # CodingRecord aggregate, state machine, ledger,
//! │                    # queries, audit trail, invariants, errors, config
//! ├── ports/           # CodingWorkflowApi, RecordStore, SequenceAllocator,
//! │                    # BillingGateway, TimeSource
//! ├── adapters/        # In-memory store/billing/time implementations
//! └── service.rs       # CodingWorkflowService (transition enforcement,
//!                      # bounded CAS retries, deadlines, billing sync)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use coding_engine::adapters::{InMemoryBillingGateway, InMemoryRecordStore, SystemTimeSource};
//! use coding_engine::{CodingWorkflowService, WorkflowConfig};
//!
//! let store = InMemoryRecordStore::new();
//! let service = CodingWorkflowService::new(
//!     store.clone(),
//!     store,
//!     InMemoryBillingGateway::new(),
//!     SystemTimeSource,
//!     WorkflowConfig::default(),
//! )?;
//!
//! let record = service.create_record(new_record, actor).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use domain::{
    replay, AssignedCode, AuditDetails, AuditEntry, CodingError, CodingNumber, CodingQuery,
    CodingRecord, CodingStatus, DiagnosisCode, NewAssignedCode, NewCodingRecord, QueryStatus,
    ReplayedState, ReturnEntry, TransitionAction, WorkflowConfig,
};
pub use ports::{
    BillingGateway, CodingWorkflowApi, MockBillingGateway, Page, RecordStore, SequenceAllocator,
    TimeSource, VersionedRecord,
};
pub use service::CodingWorkflowService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
