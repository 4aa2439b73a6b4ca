//! # Inbound Port
//!
//! The operation-oriented API of the coding subsystem, consumed by an
//! HTTP/RPC layer outside this crate. Every mutating operation takes the
//! acting user's identity from the external auth collaborator; the engine
//! never authenticates, it only records who acted.

use crate::domain::{
    CodingError, CodingRecord, CodingStatus, DiagnosisCode, NewAssignedCode, NewCodingRecord,
    TransitionAction,
};
use crate::ports::outbound::Page;
use async_trait::async_trait;
use shared_types::{ActorId, BillRef, RecordId};
use uuid::Uuid;

/// Coding workflow API - inbound port.
#[async_trait]
pub trait CodingWorkflowApi: Send + Sync {
    /// Create the coding record for a freshly closed encounter.
    ///
    /// Allocates the record's coding number; fails with
    /// `DuplicateEncounter` when the encounter already has a record.
    async fn create_record(
        &self,
        new: NewCodingRecord,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError>;

    /// Append a procedure code line item.
    async fn assign_code(
        &self,
        id: RecordId,
        item: NewAssignedCode,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError>;

    /// Remove a procedure code line item.
    async fn remove_code(
        &self,
        id: RecordId,
        line_id: Uuid,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError>;

    /// Append a diagnosis code entry.
    async fn add_diagnosis(
        &self,
        id: RecordId,
        diagnosis: DiagnosisCode,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError>;

    /// Remove a diagnosis code entry.
    async fn remove_diagnosis(
        &self,
        id: RecordId,
        code: &str,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError>;

    /// Move the primary flag to the given diagnosis code.
    async fn set_primary_diagnosis(
        &self,
        id: RecordId,
        code: &str,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError>;

    /// Raise a coder query against the finalizing clinician.
    async fn raise_query(
        &self,
        id: RecordId,
        text: &str,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError>;

    /// Answer an open query.
    async fn answer_query(
        &self,
        id: RecordId,
        query_id: Uuid,
        response: &str,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError>;

    /// Close an answered query.
    async fn close_query(
        &self,
        id: RecordId,
        query_id: Uuid,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError>;

    /// Generic workflow transition entry point.
    ///
    /// Enforces the transition table. Actions that carry their own payload
    /// (`assign_codes`, `raise_query`, `answer_query`) must use their
    /// dedicated operations; `sync_bill` is routed through
    /// [`Self::sync_billing`].
    async fn transition(
        &self,
        id: RecordId,
        action: TransitionAction,
        actor: ActorId,
        note: Option<String>,
    ) -> Result<CodingRecord, CodingError>;

    /// Sync a submitted record into billing and close it.
    ///
    /// Idempotent: a record whose bill is already linked is returned
    /// unchanged. `BillingUnavailable` leaves the record in `submitted`.
    async fn sync_billing(&self, id: RecordId, actor: ActorId)
        -> Result<CodingRecord, CodingError>;

    /// Retry billing sync for every record stuck in `submitted`.
    ///
    /// Returns the bills linked by this pass; records whose sync still
    /// fails stay in `submitted` and are picked up by the next sweep.
    async fn sweep_submitted(
        &self,
        actor: ActorId,
    ) -> Result<Vec<(RecordId, BillRef)>, CodingError>;

    /// Append a free-form, non-status audit annotation.
    async fn add_audit_note(
        &self,
        id: RecordId,
        message: &str,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError>;

    /// Fetch a record (the derived total is computed by the caller via
    /// [`CodingRecord::total_amount`]).
    async fn get_record(&self, id: RecordId) -> Result<CodingRecord, CodingError>;

    /// Work-queue view: records in a status, paginated.
    async fn list_queue(
        &self,
        status: CodingStatus,
        page: Page,
    ) -> Result<Vec<CodingRecord>, CodingError>;

    /// Work-queue view: a coder's active records.
    async fn list_by_coder(&self, coder: &ActorId) -> Result<Vec<CodingRecord>, CodingError>;
}
