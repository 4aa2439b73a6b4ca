//! # Line-Item Ledger
//!
//! Mutations of the embedded procedure and diagnosis collections, and the
//! derived total. Every operation stamps the acting user, appends its audit
//! annotation and re-validates the aggregate's invariants; callers never
//! replace the collections directly.

use super::audit::AuditDetails;
use super::entities::{AssignedCode, CodingRecord, DiagnosisCode, NewAssignedCode};
use super::errors::CodingError;
use super::invariants;
use super::value_objects::{CodingStatus, TransitionAction};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared_types::{ActorId, Money};
use uuid::Uuid;

/// Derived total billable amount: Σ amount × quantity.
///
/// Pure and O(n); recomputed on demand so it can never drift from the line
/// items.
pub fn total_amount(codes: &[AssignedCode]) -> Money {
    codes
        .iter()
        .map(|c| c.amount * Decimal::from(c.quantity))
        .sum()
}

/// Append a procedure code line item.
///
/// Stamps `added_by`/`added_at`, appends a `codes_added` audit annotation
/// and, when this is the first code on an `awaiting_coding` record, moves
/// the record to `coded`. Returns the new line item's identifier.
pub fn add_assigned_code(
    record: &mut CodingRecord,
    item: NewAssignedCode,
    actor: &ActorId,
    now: DateTime<Utc>,
) -> Result<Uuid, CodingError> {
    invariants::invariant_ledger_mutable(record.status)?;
    invariants::invariant_quantity_positive(item.quantity)?;
    invariants::invariant_non_empty(&item.code, "procedure code")?;

    let assigned = item.into_assigned(actor.clone(), now);
    let line_id = assigned.line_id;
    record.assigned_codes.push(assigned.clone());
    record.append_audit(
        AuditDetails::CodesAdded { item: assigned },
        actor,
        now,
        None,
        None,
    );

    if record.status == CodingStatus::AwaitingCoding {
        record.apply_transition(TransitionAction::AssignCodes, actor, now, None)?;
    }
    Ok(line_id)
}

/// Remove a procedure code line item by its identifier.
///
/// The audit annotation carries the removed item snapshot so the removal
/// can be replayed forensically.
pub fn remove_assigned_code(
    record: &mut CodingRecord,
    line_id: Uuid,
    actor: &ActorId,
    now: DateTime<Utc>,
) -> Result<AssignedCode, CodingError> {
    invariants::invariant_ledger_mutable(record.status)?;

    let index = record
        .assigned_codes
        .iter()
        .position(|c| c.line_id == line_id)
        .ok_or(CodingError::LineItemNotFound { line_id })?;
    let removed = record.assigned_codes.remove(index);
    record.append_audit(
        AuditDetails::CodesRemoved {
            item: removed.clone(),
        },
        actor,
        now,
        None,
        None,
    );
    Ok(removed)
}

/// Append a diagnosis code entry.
///
/// When the new entry claims the primary flag, any existing primary is
/// cleared in the same mutation so the single-primary invariant holds at
/// every commit point.
pub fn add_diagnosis(
    record: &mut CodingRecord,
    diagnosis: DiagnosisCode,
    actor: &ActorId,
    now: DateTime<Utc>,
) -> Result<(), CodingError> {
    invariants::invariant_ledger_mutable(record.status)?;
    invariants::invariant_non_empty(&diagnosis.code, "diagnosis code")?;
    if record.diagnosis_codes.iter().any(|d| d.code == diagnosis.code) {
        return Err(CodingError::validation(format!(
            "diagnosis {} is already on the record",
            diagnosis.code
        )));
    }

    if diagnosis.is_primary {
        for dx in &mut record.diagnosis_codes {
            dx.is_primary = false;
        }
    }
    record.diagnosis_codes.push(diagnosis.clone());
    debug_assert!(invariants::invariant_single_primary(&record.diagnosis_codes));
    record.append_audit(
        AuditDetails::DiagnosisAdded { item: diagnosis },
        actor,
        now,
        None,
        None,
    );
    Ok(())
}

/// Remove a diagnosis code entry by code.
pub fn remove_diagnosis(
    record: &mut CodingRecord,
    code: &str,
    actor: &ActorId,
    now: DateTime<Utc>,
) -> Result<DiagnosisCode, CodingError> {
    invariants::invariant_ledger_mutable(record.status)?;

    let index = record
        .diagnosis_codes
        .iter()
        .position(|d| d.code == code)
        .ok_or_else(|| CodingError::DiagnosisNotFound { code: code.to_string() })?;
    let removed = record.diagnosis_codes.remove(index);
    record.append_audit(
        AuditDetails::DiagnosisRemoved {
            item: removed.clone(),
        },
        actor,
        now,
        None,
        None,
    );
    Ok(removed)
}

/// Move the primary flag to the given diagnosis code.
///
/// Clears any existing primary before setting the new one; the two steps
/// commit together, so exactly one entry carries the flag afterwards.
pub fn set_primary_diagnosis(
    record: &mut CodingRecord,
    code: &str,
    actor: &ActorId,
    now: DateTime<Utc>,
) -> Result<(), CodingError> {
    invariants::invariant_ledger_mutable(record.status)?;

    if !record.diagnosis_codes.iter().any(|d| d.code == code) {
        return Err(CodingError::DiagnosisNotFound { code: code.to_string() });
    }

    let cleared = record
        .diagnosis_codes
        .iter()
        .find(|d| d.is_primary && d.code != code)
        .map(|d| d.code.clone());
    for dx in &mut record.diagnosis_codes {
        dx.is_primary = dx.code == code;
    }
    debug_assert!(invariants::invariant_single_primary(&record.diagnosis_codes));
    record.append_audit(
        AuditDetails::PrimaryDiagnosisSet {
            code: code.to_string(),
            cleared,
        },
        actor,
        now,
        None,
        None,
    );
    Ok(())
}
