//! # Domain Value Objects
//!
//! Immutable value types for the coding workflow: the record status state
//! machine, workflow actions, query lifecycle states and the human-readable
//! coding number.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coding record status state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodingStatus {
    /// Encounter closed, waiting for a coder to pick it up.
    #[default]
    AwaitingCoding,
    /// At least one procedure code assigned.
    Coded,
    /// Submitted to a reviewer, awaiting verdict.
    UnderReview,
    /// A coder question to the finalizing clinician is outstanding.
    Queried,
    /// Reviewer sent the record back with a reason.
    Returned,
    /// Coder resubmitted after addressing the return reason.
    Resubmitted,
    /// Reviewer approved the coding.
    Approved,
    /// Handed to the billing clerk, awaiting billing sync.
    Submitted,
    /// Synced into a bill. Terminal.
    Closed,
}

impl CodingStatus {
    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Whether records in this status belong on active work queues.
    pub fn is_active_work(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for CodingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CodingStatus::AwaitingCoding => "awaiting_coding",
            CodingStatus::Coded => "coded",
            CodingStatus::UnderReview => "under_review",
            CodingStatus::Queried => "queried",
            CodingStatus::Returned => "returned",
            CodingStatus::Resubmitted => "resubmitted",
            CodingStatus::Approved => "approved",
            CodingStatus::Submitted => "submitted",
            CodingStatus::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Workflow actions that drive the status state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionAction {
    /// Coder assigns the first procedure codes.
    AssignCodes,
    /// Coder raises a question to the finalizing clinician.
    RaiseQuery,
    /// Finalizing clinician answers an open query.
    AnswerQuery,
    /// Coder submits the record for review.
    SubmitForReview,
    /// Reviewer approves the coding.
    ApproveReview,
    /// Reviewer returns the record to the coder with a reason.
    ReturnToCoder,
    /// Coder resubmits a returned record.
    Resubmit,
    /// Billing clerk hands the approved record to billing.
    SubmitToBilling,
    /// Billing sync confirms and closes the record.
    SyncBill,
}

impl TransitionAction {
    /// Destination status when this action is applied from `from`.
    ///
    /// `None` means the action is not legal from that status. This table is
    /// the single authority on which transitions exist; preconditions beyond
    /// the source status are checked by the record itself.
    pub fn target_from(&self, from: CodingStatus) -> Option<CodingStatus> {
        use CodingStatus::*;
        match (self, from) {
            (Self::AssignCodes, AwaitingCoding) => Some(Coded),
            (Self::RaiseQuery, Coded) => Some(Queried),
            (Self::AnswerQuery, Queried) => Some(Coded),
            (Self::SubmitForReview, Coded) => Some(UnderReview),
            (Self::SubmitForReview, Resubmitted) => Some(UnderReview),
            (Self::ApproveReview, UnderReview) => Some(Approved),
            (Self::ReturnToCoder, UnderReview) => Some(Returned),
            (Self::Resubmit, Returned) => Some(Resubmitted),
            (Self::SubmitToBilling, Approved) => Some(Submitted),
            (Self::SyncBill, Submitted) => Some(Closed),
            _ => None,
        }
    }
}

impl fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransitionAction::AssignCodes => "assign_codes",
            TransitionAction::RaiseQuery => "raise_query",
            TransitionAction::AnswerQuery => "answer_query",
            TransitionAction::SubmitForReview => "submit_for_review",
            TransitionAction::ApproveReview => "approve_review",
            TransitionAction::ReturnToCoder => "return_to_coder",
            TransitionAction::Resubmit => "resubmit",
            TransitionAction::SubmitToBilling => "submit_to_billing",
            TransitionAction::SyncBill => "sync_bill",
        };
        f.write_str(s)
    }
}

/// Lifecycle of a single coder query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// Raised, waiting for the finalizing clinician.
    #[default]
    Open,
    /// Answered, waiting for the coder to acknowledge.
    Answered,
    /// Acknowledged by the coder. Terminal.
    Closed,
}

/// Human-readable coding record identifier.
///
/// Format: `COD` + 8-digit date + 5-digit zero-padded day sequence,
/// e.g. `COD2026080700042`. Assigned exactly once at creation, unique
/// across all records, immutable thereafter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodingNumber(String);

impl CodingNumber {
    /// Format a number for the given day and day-scoped sequence.
    pub fn format(day: NaiveDate, sequence: u32) -> Self {
        Self(format!("COD{}{:05}", day.format("%Y%m%d"), sequence))
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CodingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
