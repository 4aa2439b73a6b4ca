//! # Domain Entities
//!
//! The coding record aggregate and its owned child records.
//!
//! A `CodingRecord` tracks one clinical encounter's coding workflow from
//! creation through review, query resolution, return cycles, approval and
//! billing sync. All mutation goes through the workflow operations; the
//! embedded collections are never replaced wholesale, so every write
//! re-validates the aggregate's invariants.

use super::audit::{AuditDetails, AuditEntry};
use super::errors::CodingError;
use super::invariants;
use super::value_objects::{CodingNumber, CodingStatus, QueryStatus, TransitionAction};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared_types::{ActorId, BillRef, EncounterKind, EncounterRef, Money, PatientRef, RecordId};
use uuid::Uuid;

/// One assigned procedure code line item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssignedCode {
    /// Stable identity of the line item within the record.
    pub line_id: Uuid,
    /// Procedure code, e.g. a CPT code.
    pub code: String,
    /// Billed quantity, at least 1.
    pub quantity: u32,
    /// First procedure modifier.
    pub modifier: Option<String>,
    /// Second procedure modifier.
    pub modifier2: Option<String>,
    /// 1-based pointer into the record's diagnosis list.
    pub diagnosis_pointer: Option<u8>,
    /// Service units, for unit-billed codes.
    pub units: Option<Decimal>,
    /// Amount per quantity unit.
    pub amount: Money,
    /// Coder notes on the line item.
    pub notes: Option<String>,
    /// Who added the line item.
    pub added_by: ActorId,
    /// When the line item was added.
    pub added_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new line item; the engine stamps identity,
/// actor and timestamp.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewAssignedCode {
    /// Procedure code.
    pub code: String,
    /// Billed quantity, at least 1.
    pub quantity: u32,
    /// First procedure modifier.
    pub modifier: Option<String>,
    /// Second procedure modifier.
    pub modifier2: Option<String>,
    /// 1-based pointer into the record's diagnosis list.
    pub diagnosis_pointer: Option<u8>,
    /// Service units, for unit-billed codes.
    pub units: Option<Decimal>,
    /// Amount per quantity unit.
    pub amount: Money,
    /// Coder notes on the line item.
    pub notes: Option<String>,
}

impl NewAssignedCode {
    /// Minimal line item: code, quantity and amount.
    pub fn new(code: impl Into<String>, quantity: u32, amount: Money) -> Self {
        Self {
            code: code.into(),
            quantity,
            modifier: None,
            modifier2: None,
            diagnosis_pointer: None,
            units: None,
            amount,
            notes: None,
        }
    }

    /// Stamp identity, actor and timestamp, producing the stored line item.
    pub(crate) fn into_assigned(self, added_by: ActorId, added_at: DateTime<Utc>) -> AssignedCode {
        AssignedCode {
            line_id: Uuid::new_v4(),
            code: self.code,
            quantity: self.quantity,
            modifier: self.modifier,
            modifier2: self.modifier2,
            diagnosis_pointer: self.diagnosis_pointer,
            units: self.units,
            amount: self.amount,
            notes: self.notes,
            added_by,
            added_at,
        }
    }
}

/// One diagnosis code entry. At most one entry per record carries the
/// primary flag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisCode {
    /// Diagnosis code, e.g. an ICD-10 code.
    pub code: String,
    /// Human-readable description.
    pub description: String,
    /// Whether this is the principal diagnosis.
    pub is_primary: bool,
    /// Display ordering within the record.
    pub sequence: u16,
}

/// A coder question to the finalizing clinician.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CodingQuery {
    /// Stable identity of the query within the record.
    pub query_id: Uuid,
    /// The question text.
    pub text: String,
    /// Coder who raised the query.
    pub raised_by: ActorId,
    /// When the query was raised.
    pub raised_at: DateTime<Utc>,
    /// Clinician response, once answered.
    pub response: Option<String>,
    /// Who answered.
    pub responded_by: Option<ActorId>,
    /// When it was answered.
    pub responded_at: Option<DateTime<Utc>>,
    /// Lifecycle state.
    pub status: QueryStatus,
}

/// One reviewer return, resolved when the record re-enters `resubmitted`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReturnEntry {
    /// Reviewer who returned the record.
    pub returned_by: ActorId,
    /// When the record was returned.
    pub returned_at: DateTime<Utc>,
    /// Why the record was returned.
    pub reason: String,
    /// When the coder resubmitted, resolving this return.
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Caller-supplied fields for record creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewCodingRecord {
    /// Patient the encounter belongs to.
    pub patient: PatientRef,
    /// The encounter requiring coding.
    pub encounter: EncounterRef,
    /// Kind of the encounter.
    pub encounter_kind: EncounterKind,
    /// Clinician who closed the encounter.
    pub finalizing_clinician: ActorId,
}

/// The coding record aggregate, one per clinical encounter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CodingRecord {
    /// Opaque storage key, assigned at creation, immutable.
    pub id: RecordId,
    /// Human identifier, assigned exactly once at creation, immutable.
    pub coding_number: CodingNumber,
    /// Patient the encounter belongs to.
    pub patient: PatientRef,
    /// The encounter requiring coding; `(encounter, encounter_kind)` is
    /// unique across all records.
    pub encounter: EncounterRef,
    /// Kind of the encounter.
    pub encounter_kind: EncounterKind,
    /// Clinician who closed the encounter. Immutable.
    pub finalizing_clinician: ActorId,
    /// Current workflow status.
    pub status: CodingStatus,
    /// Assigned procedure code line items, in insertion order.
    pub assigned_codes: Vec<AssignedCode>,
    /// Diagnosis codes, in insertion order.
    pub diagnosis_codes: Vec<DiagnosisCode>,
    /// Coder queries, in insertion order.
    pub queries: Vec<CodingQuery>,
    /// Reviewer returns, in insertion order.
    pub return_history: Vec<ReturnEntry>,
    /// Reason of the most recent unresolved return.
    pub current_return_reason: Option<String>,
    /// Append-only audit trail.
    pub audit_trail: Vec<AuditEntry>,
    /// Bill reference, set once from `approved`/`submitted`.
    pub linked_bill: Option<BillRef>,
    /// When the billing sync succeeded.
    pub bill_synced_at: Option<DateTime<Utc>>,
    /// Coder who moved the record to `coded`.
    pub coded_by: Option<ActorId>,
    /// When the record reached `coded`.
    pub coded_at: Option<DateTime<Utc>>,
    /// Reviewer who issued the most recent review verdict.
    pub reviewed_by: Option<ActorId>,
    /// When the most recent review verdict was issued.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Billing clerk who submitted to billing.
    pub submitted_by: Option<ActorId>,
    /// When the record was submitted to billing.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Reviewer who approved.
    pub approved_by: Option<ActorId>,
    /// When the record was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// Who created the record.
    pub created_by: ActorId,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl CodingRecord {
    /// Create a record in `awaiting_coding` with its creation audit entry.
    pub fn new(
        params: NewCodingRecord,
        coding_number: CodingNumber,
        created_by: ActorId,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut record = Self {
            id: RecordId::generate(),
            coding_number: coding_number.clone(),
            patient: params.patient,
            encounter: params.encounter,
            encounter_kind: params.encounter_kind,
            finalizing_clinician: params.finalizing_clinician,
            status: CodingStatus::AwaitingCoding,
            assigned_codes: Vec::new(),
            diagnosis_codes: Vec::new(),
            queries: Vec::new(),
            return_history: Vec::new(),
            current_return_reason: None,
            audit_trail: Vec::new(),
            linked_bill: None,
            bill_synced_at: None,
            coded_by: None,
            coded_at: None,
            reviewed_by: None,
            reviewed_at: None,
            submitted_by: None,
            submitted_at: None,
            approved_by: None,
            approved_at: None,
            created_by: created_by.clone(),
            created_at,
        };
        record.append_audit(
            AuditDetails::RecordCreated {
                coding_number: coding_number.as_str().to_string(),
            },
            &created_by,
            created_at,
            None,
            Some(CodingStatus::AwaitingCoding),
        );
        record
    }

    /// Derived total billable amount: Σ amount × quantity over the line
    /// items. Recomputed on every call, never persisted.
    pub fn total_amount(&self) -> Money {
        super::ledger::total_amount(&self.assigned_codes)
    }

    /// Whether any query is still open.
    pub fn has_open_queries(&self) -> bool {
        self.queries.iter().any(|q| q.status == QueryStatus::Open)
    }

    /// Whether any return is still unresolved.
    pub fn has_unresolved_returns(&self) -> bool {
        self.return_history.iter().any(|r| r.resolved_at.is_none())
    }

    /// Find a query by its identifier.
    pub fn find_query(&self, query_id: Uuid) -> Option<&CodingQuery> {
        self.queries.iter().find(|q| q.query_id == query_id)
    }

    pub(crate) fn find_query_mut(&mut self, query_id: Uuid) -> Option<&mut CodingQuery> {
        self.queries.iter_mut().find(|q| q.query_id == query_id)
    }

    /// Append an audit entry with the next per-record sequence number.
    pub(crate) fn append_audit(
        &mut self,
        details: AuditDetails,
        performed_by: &ActorId,
        performed_at: DateTime<Utc>,
        previous_status: Option<CodingStatus>,
        new_status: Option<CodingStatus>,
    ) {
        let seq = self.audit_trail.len() as u64;
        self.audit_trail.push(AuditEntry {
            seq,
            performed_by: performed_by.clone(),
            performed_at,
            details,
            previous_status,
            new_status,
        });
    }

    /// Execute a status transition: validate the action against the
    /// transition table and its preconditions, apply the per-action side
    /// effects, move the status and append exactly one audit entry.
    ///
    /// On any error the record is left untouched and no audit entry is
    /// written.
    pub fn apply_transition(
        &mut self,
        action: TransitionAction,
        actor: &ActorId,
        now: DateTime<Utc>,
        note: Option<String>,
    ) -> Result<CodingStatus, CodingError> {
        let target = action
            .target_from(self.status)
            .ok_or(CodingError::InvalidTransition {
                from: self.status,
                action,
            })?;

        // Preconditions first: nothing below may mutate until they pass.
        match action {
            TransitionAction::AssignCodes => {
                invariants::invariant_codes_assigned(&self.assigned_codes)?;
            }
            TransitionAction::SubmitForReview => {
                invariants::invariant_no_open_queries(&self.queries)?;
                if self.status == CodingStatus::Resubmitted {
                    invariants::invariant_returns_resolved(&self.return_history)?;
                }
            }
            TransitionAction::ApproveReview => {
                invariants::invariant_no_open_queries(&self.queries)?;
            }
            TransitionAction::ReturnToCoder => {
                invariants::invariant_non_empty(note.as_deref().unwrap_or(""), "return reason")?;
            }
            TransitionAction::Resubmit => {
                invariants::invariant_unresolved_return(&self.return_history)?;
            }
            TransitionAction::SubmitToBilling => {
                invariants::invariant_bill_unlinked(&self.linked_bill)?;
            }
            TransitionAction::SyncBill => {
                invariants::invariant_bill_linked(&self.linked_bill)?;
            }
            TransitionAction::RaiseQuery | TransitionAction::AnswerQuery => {}
        }

        match action {
            TransitionAction::AssignCodes => {
                self.coded_by = Some(actor.clone());
                self.coded_at = Some(now);
            }
            TransitionAction::ApproveReview => {
                self.reviewed_by = Some(actor.clone());
                self.reviewed_at = Some(now);
                self.approved_by = Some(actor.clone());
                self.approved_at = Some(now);
            }
            TransitionAction::ReturnToCoder => {
                // Precondition above guarantees the reason is present.
                let reason = note.clone().unwrap_or_default();
                self.return_history.push(ReturnEntry {
                    returned_by: actor.clone(),
                    returned_at: now,
                    reason: reason.clone(),
                    resolved_at: None,
                });
                self.current_return_reason = Some(reason);
                self.reviewed_by = Some(actor.clone());
                self.reviewed_at = Some(now);
            }
            TransitionAction::Resubmit => {
                for entry in &mut self.return_history {
                    if entry.resolved_at.is_none() {
                        entry.resolved_at = Some(now);
                    }
                }
                self.current_return_reason = None;
            }
            TransitionAction::SubmitToBilling => {
                self.submitted_by = Some(actor.clone());
                self.submitted_at = Some(now);
            }
            _ => {}
        }

        let previous = self.status;
        self.status = target;
        self.append_audit(
            AuditDetails::Transitioned { action, note },
            actor,
            now,
            Some(previous),
            Some(target),
        );
        Ok(target)
    }
}
