//! # Domain Invariants
//!
//! Business rules for the coding workflow, checked before any mutation is
//! applied. Each function either proves the rule holds or returns the error
//! the caller surfaces unchanged.

use super::entities::{AssignedCode, CodingQuery, DiagnosisCode, ReturnEntry};
use super::errors::CodingError;
use super::value_objects::{CodingStatus, QueryStatus};
use shared_types::BillRef;

/// A record can only leave `awaiting_coding` once at least one procedure
/// code line item has been assigned.
pub fn invariant_codes_assigned(codes: &[AssignedCode]) -> Result<(), CodingError> {
    if codes.is_empty() {
        return Err(CodingError::validation(
            "at least one assigned code is required",
        ));
    }
    Ok(())
}

/// Line item quantity must be at least 1.
pub fn invariant_quantity_positive(quantity: u32) -> Result<(), CodingError> {
    if quantity < 1 {
        return Err(CodingError::validation("quantity must be at least 1"));
    }
    Ok(())
}

/// Free-text inputs (query text, responses, return reasons) must be
/// non-empty after trimming.
pub fn invariant_non_empty(text: &str, what: &str) -> Result<(), CodingError> {
    if text.trim().is_empty() {
        return Err(CodingError::validation(format!("{what} is required")));
    }
    Ok(())
}

/// Review progress is blocked while any query is still open.
pub fn invariant_no_open_queries(queries: &[CodingQuery]) -> Result<(), CodingError> {
    let open = queries.iter().filter(|q| q.status == QueryStatus::Open).count();
    if open > 0 {
        return Err(CodingError::validation(format!(
            "{open} open query(ies) must be answered first"
        )));
    }
    Ok(())
}

/// A resubmitted record must carry no unresolved returns.
pub fn invariant_returns_resolved(history: &[ReturnEntry]) -> Result<(), CodingError> {
    if history.iter().any(|r| r.resolved_at.is_none()) {
        return Err(CodingError::validation(
            "an unresolved return is still outstanding",
        ));
    }
    Ok(())
}

/// Resubmission only makes sense while a return is unresolved.
pub fn invariant_unresolved_return(history: &[ReturnEntry]) -> Result<(), CodingError> {
    if !history.iter().any(|r| r.resolved_at.is_none()) {
        return Err(CodingError::validation(
            "no unresolved return to resubmit against",
        ));
    }
    Ok(())
}

/// Submission to billing requires the bill reference to be unset.
pub fn invariant_bill_unlinked(linked_bill: &Option<BillRef>) -> Result<(), CodingError> {
    if linked_bill.is_some() {
        return Err(CodingError::validation("record is already linked to a bill"));
    }
    Ok(())
}

/// Closing requires a successful billing sync, witnessed by the bill link.
pub fn invariant_bill_linked(linked_bill: &Option<BillRef>) -> Result<(), CodingError> {
    if linked_bill.is_none() {
        return Err(CodingError::validation(
            "billing sync has not linked a bill yet",
        ));
    }
    Ok(())
}

/// Line items and diagnoses are frozen once the record passes review.
pub fn invariant_ledger_mutable(status: CodingStatus) -> Result<(), CodingError> {
    match status {
        CodingStatus::Approved | CodingStatus::Submitted | CodingStatus::Closed => Err(
            CodingError::validation(format!("record in status {status} is finalized")),
        ),
        _ => Ok(()),
    }
}

/// At most one diagnosis entry may carry the primary flag.
pub fn invariant_single_primary(diagnoses: &[DiagnosisCode]) -> bool {
    diagnoses.iter().filter(|d| d.is_primary).count() <= 1
}
