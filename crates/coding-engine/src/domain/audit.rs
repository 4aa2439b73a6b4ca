//! # Audit Trail
//!
//! Append-only, time-ordered log of every mutation on a coding record.
//!
//! The trail is the authoritative history: the record's top-level fields are
//! a materialized view that [`replay`] can re-derive at any time. Entries are
//! ordered by a monotonic per-record sequence number assigned at append, so
//! ordering never depends on wall-clock comparisons.

use super::entities::{AssignedCode, DiagnosisCode};
use super::errors::CodingError;
use super::value_objects::{CodingStatus, TransitionAction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{ActorId, BillRef};
use uuid::Uuid;

/// One audit trail entry. Never mutated or removed once appended.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Monotonic append sequence within the record, starting at 0.
    pub seq: u64,
    /// Who performed the mutation.
    pub performed_by: ActorId,
    /// When the mutation was committed.
    pub performed_at: DateTime<Utc>,
    /// Action-scoped payload; its tag is the entry's action name.
    pub details: AuditDetails,
    /// Status before the mutation, when the entry records a status change.
    pub previous_status: Option<CodingStatus>,
    /// Status after the mutation, when the entry records a status change.
    pub new_status: Option<CodingStatus>,
}

impl AuditEntry {
    /// The action name this entry was appended under.
    pub fn action(&self) -> &'static str {
        self.details.action()
    }

    /// Whether this entry records a status change.
    pub fn is_status_change(&self) -> bool {
        self.new_status.is_some()
    }
}

/// Action-scoped audit payload.
///
/// Each action kind carries exactly the fields it needs, so the expected
/// shape of `details` is documented by the type instead of a free-form map.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuditDetails {
    /// Record created by the encounter-finalization collaborator.
    RecordCreated {
        /// The number allocated at creation.
        coding_number: String,
    },
    /// A procedure code line item was appended.
    CodesAdded {
        /// The appended line item.
        item: AssignedCode,
    },
    /// A procedure code line item was removed; the snapshot allows
    /// forensic replay of the removal.
    CodesRemoved {
        /// The removed line item as it was at removal time.
        item: AssignedCode,
    },
    /// A diagnosis code was appended.
    DiagnosisAdded {
        /// The appended diagnosis entry.
        item: DiagnosisCode,
    },
    /// A diagnosis code was removed.
    DiagnosisRemoved {
        /// The removed diagnosis entry.
        item: DiagnosisCode,
    },
    /// The primary diagnosis flag moved to a new code.
    PrimaryDiagnosisSet {
        /// Code now carrying the primary flag.
        code: String,
        /// Code that lost the flag, when there was one.
        cleared: Option<String>,
    },
    /// A coder query was raised.
    QueryRaised {
        /// Identifier of the new query.
        query_id: Uuid,
        /// The question text.
        text: String,
    },
    /// An open query was answered by the finalizing clinician.
    QueryAnswered {
        /// Identifier of the answered query.
        query_id: Uuid,
        /// The response text.
        response: String,
    },
    /// An answered query was acknowledged and closed.
    QueryClosed {
        /// Identifier of the closed query.
        query_id: Uuid,
    },
    /// A status transition was executed. The only entry kind that moves
    /// `previous_status`/`new_status`.
    Transitioned {
        /// The action that drove the transition.
        #[serde(rename = "transition_action")]
        action: TransitionAction,
        /// Actor-supplied detail, e.g. a return reason.
        note: Option<String>,
    },
    /// The record was linked to a bill by a successful billing sync.
    BillLinked {
        /// Reference of the bill created by the billing subsystem.
        bill: BillRef,
    },
    /// Free-form, non-status annotation.
    Note {
        /// Annotation text.
        message: String,
    },
}

impl AuditDetails {
    /// Stable action name, matching the serialized `action` tag.
    pub fn action(&self) -> &'static str {
        match self {
            AuditDetails::RecordCreated { .. } => "record_created",
            AuditDetails::CodesAdded { .. } => "codes_added",
            AuditDetails::CodesRemoved { .. } => "codes_removed",
            AuditDetails::DiagnosisAdded { .. } => "diagnosis_added",
            AuditDetails::DiagnosisRemoved { .. } => "diagnosis_removed",
            AuditDetails::PrimaryDiagnosisSet { .. } => "primary_diagnosis_set",
            AuditDetails::QueryRaised { .. } => "query_raised",
            AuditDetails::QueryAnswered { .. } => "query_answered",
            AuditDetails::QueryClosed { .. } => "query_closed",
            AuditDetails::Transitioned { .. } => "transitioned",
            AuditDetails::BillLinked { .. } => "bill_linked",
            AuditDetails::Note { .. } => "note",
        }
    }
}

/// State re-derived from an audit trail by [`replay`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReplayedState {
    /// Status after applying every transition in order.
    pub status: CodingStatus,
    /// Line-item composition after applying every add/remove.
    pub assigned_codes: Vec<AssignedCode>,
    /// Diagnosis composition after applying every add/remove/primary move.
    pub diagnosis_codes: Vec<DiagnosisCode>,
}

/// Replay a trail in order and re-derive the record's materialized state.
///
/// Deterministic: status moves only on `record_created` and `transitioned`
/// entries, applied through the transition table; collection entries carry
/// full item snapshots. Fails with [`CodingError::CorruptTrail`] when an
/// entry cannot be applied, which indicates the trail was tampered with or
/// an append was not atomic with its mutation.
pub fn replay(trail: &[AuditEntry]) -> Result<ReplayedState, CodingError> {
    let mut state = ReplayedState::default();

    for entry in trail {
        match &entry.details {
            AuditDetails::RecordCreated { .. } => {
                state.status = CodingStatus::AwaitingCoding;
            }
            AuditDetails::CodesAdded { item } => {
                state.assigned_codes.push(item.clone());
            }
            AuditDetails::CodesRemoved { item } => {
                let before = state.assigned_codes.len();
                state.assigned_codes.retain(|c| c.line_id != item.line_id);
                if state.assigned_codes.len() == before {
                    return Err(CodingError::CorruptTrail {
                        seq: entry.seq,
                        reason: format!("removal of unknown line item {}", item.line_id),
                    });
                }
            }
            AuditDetails::DiagnosisAdded { item } => {
                if item.is_primary {
                    for dx in &mut state.diagnosis_codes {
                        dx.is_primary = false;
                    }
                }
                state.diagnosis_codes.push(item.clone());
            }
            AuditDetails::DiagnosisRemoved { item } => {
                let before = state.diagnosis_codes.len();
                state.diagnosis_codes.retain(|d| d.code != item.code);
                if state.diagnosis_codes.len() == before {
                    return Err(CodingError::CorruptTrail {
                        seq: entry.seq,
                        reason: format!("removal of unknown diagnosis {}", item.code),
                    });
                }
            }
            AuditDetails::PrimaryDiagnosisSet { code, .. } => {
                let mut found = false;
                for dx in &mut state.diagnosis_codes {
                    dx.is_primary = dx.code == *code;
                    found |= dx.is_primary;
                }
                if !found {
                    return Err(CodingError::CorruptTrail {
                        seq: entry.seq,
                        reason: format!("primary flag moved to unknown diagnosis {code}"),
                    });
                }
            }
            AuditDetails::Transitioned { action, .. } => {
                state.status = action.target_from(state.status).ok_or_else(|| {
                    CodingError::CorruptTrail {
                        seq: entry.seq,
                        reason: format!("{} not applicable from {}", action, state.status),
                    }
                })?;
            }
            AuditDetails::QueryRaised { .. }
            | AuditDetails::QueryAnswered { .. }
            | AuditDetails::QueryClosed { .. }
            | AuditDetails::BillLinked { .. }
            | AuditDetails::Note { .. } => {}
        }
    }

    Ok(state)
}
