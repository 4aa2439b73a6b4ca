//! # Domain Layer
//!
//! Pure workflow logic: the coding record aggregate, its status state
//! machine, the line-item ledger, the query sub-workflow and the audit
//! trail. Nothing in this layer performs I/O.

pub mod audit;
pub mod config;
pub mod entities;
pub mod errors;
pub mod invariants;
pub mod ledger;
pub mod queries;
pub mod value_objects;

pub use audit::{replay, AuditDetails, AuditEntry, ReplayedState};
pub use config::WorkflowConfig;
pub use entities::{
    AssignedCode, CodingQuery, CodingRecord, DiagnosisCode, NewAssignedCode, NewCodingRecord,
    ReturnEntry,
};
pub use errors::CodingError;
pub use value_objects::{CodingNumber, CodingStatus, QueryStatus, TransitionAction};
