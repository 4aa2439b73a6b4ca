//! # Domain Errors
//!
//! Error taxonomy for the coding workflow. Every failure is local to one
//! record and one operation; none of them leaves a partial audit entry
//! behind.

use super::value_objects::{CodingNumber, CodingStatus, TransitionAction};
use shared_types::{EncounterKind, EncounterRef, RecordId};
use thiserror::Error;
use uuid::Uuid;

/// Coding workflow error taxonomy.
#[derive(Debug, Error)]
pub enum CodingError {
    /// Malformed input, rejected before any state change.
    #[error("validation failed: {reason}")]
    Validation {
        /// What was wrong with the input.
        reason: String,
    },

    /// Action not legal from the record's current status. Record unchanged.
    #[error("invalid transition: {action} from {from}")]
    InvalidTransition {
        /// Status the record was in.
        from: CodingStatus,
        /// Action that was attempted.
        action: TransitionAction,
    },

    /// Coding record not found.
    #[error("coding record not found: {id}")]
    RecordNotFound {
        /// Storage key that was looked up.
        id: RecordId,
    },

    /// Assigned-code line item not found on the record.
    #[error("line item not found: {line_id}")]
    LineItemNotFound {
        /// Line item identifier that was looked up.
        line_id: Uuid,
    },

    /// Diagnosis code not found on the record.
    #[error("diagnosis code not found: {code}")]
    DiagnosisNotFound {
        /// Diagnosis code that was looked up.
        code: String,
    },

    /// Query not found on the record.
    #[error("query not found: {query_id}")]
    QueryNotFound {
        /// Query identifier that was looked up.
        query_id: Uuid,
    },

    /// Query is no longer open.
    #[error("query already answered: {query_id}")]
    QueryAlreadyAnswered {
        /// Query identifier that was answered before.
        query_id: Uuid,
    },

    /// The encounter already has a coding record.
    #[error("encounter already has a coding record: {encounter} ({kind})")]
    DuplicateEncounter {
        /// Encounter reference of the colliding record.
        encounter: EncounterRef,
        /// Encounter kind of the colliding record.
        kind: EncounterKind,
    },

    /// The coding number is already taken.
    #[error("coding number already allocated: {number}")]
    DuplicateNumber {
        /// Number that collided.
        number: CodingNumber,
    },

    /// Optimistic-concurrency conflict that survived the retry bound.
    #[error("concurrent modification on record {id}")]
    ConcurrentModification {
        /// Record that was contended.
        id: RecordId,
    },

    /// Could not obtain a unique coding number within the retry bound.
    /// Fatal for this creation attempt, not for the system.
    #[error("coding number allocation exhausted after {attempts} attempts")]
    AllocationExhausted {
        /// How many allocation attempts were made.
        attempts: u32,
    },

    /// The billing subsystem could not be reached. The record stays in
    /// `submitted` and the sync may be retried.
    #[error("billing unavailable: {reason}")]
    BillingUnavailable {
        /// Why the sync failed.
        reason: String,
    },

    /// A store operation did not complete within its deadline.
    #[error("storage operation timed out after {timeout_ms} ms")]
    Timeout {
        /// The deadline that elapsed.
        timeout_ms: u64,
    },

    /// The audit trail could not be replayed deterministically.
    #[error("audit trail corrupt at seq {seq}: {reason}")]
    CorruptTrail {
        /// Sequence number of the offending entry.
        seq: u64,
        /// Why replay failed.
        reason: String,
    },

    /// Storage-level failure outside the taxonomy above.
    #[error("storage failure: {message}")]
    Storage {
        /// Adapter-supplied description.
        message: String,
    },
}

impl CodingError {
    /// Shorthand for a validation failure.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}
