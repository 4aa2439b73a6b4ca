//! # Coding Workflow Service
//!
//! The application service implementing [`CodingWorkflowApi`].
//!
//! ## Architecture
//!
//! This service:
//! 1. Enforces the status transition table on every mutating operation
//! 2. Delegates line-item and query mutations to the domain ledger
//! 3. Commits each mutation (field changes plus audit append) through one
//!    compare-and-swap on the record version
//! 4. Retries conflicted commits a bounded number of times with backoff
//! 5. Wraps every port call in a deadline so callers never hang
//!
//! All external dependencies arrive by injection; the service owns no
//! global state.

use crate::domain::{
    invariants, ledger, queries, AuditDetails, CodingError, CodingRecord, CodingStatus,
    DiagnosisCode, NewAssignedCode, NewCodingRecord, TransitionAction, WorkflowConfig,
};
use crate::domain::value_objects::CodingNumber;
use crate::ports::inbound::CodingWorkflowApi;
use crate::ports::outbound::{
    BillingGateway, Page, RecordStore, SequenceAllocator, TimeSource, VersionedRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{ActorId, BillRef, RecordId};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The Coding Workflow Service.
///
/// Generic over its outbound ports; production wires a document-store
/// adapter, tests wire the in-memory ones.
pub struct CodingWorkflowService<S, A, B, T>
where
    S: RecordStore,
    A: SequenceAllocator,
    B: BillingGateway,
    T: TimeSource,
{
    /// Record persistence.
    store: S,
    /// Day-scoped coding number allocator.
    allocator: A,
    /// Billing subsystem handoff.
    billing: B,
    /// Clock.
    time: T,
    /// Retry and deadline configuration.
    config: WorkflowConfig,
}

impl<S, A, B, T> CodingWorkflowService<S, A, B, T>
where
    S: RecordStore,
    A: SequenceAllocator,
    B: BillingGateway,
    T: TimeSource,
{
    /// Create a service with the given dependencies.
    ///
    /// Fails when the configuration would disable the bounded-retry
    /// guarantees.
    pub fn new(
        store: S,
        allocator: A,
        billing: B,
        time: T,
        config: WorkflowConfig,
    ) -> Result<Self, CodingError> {
        config.validate()?;
        Ok(Self {
            store,
            allocator,
            billing,
            time,
            config,
        })
    }

    /// Run a port call under the configured deadline.
    async fn timed<V>(
        &self,
        call: impl Future<Output = Result<V, CodingError>> + Send,
    ) -> Result<V, CodingError> {
        let timeout_ms = self.config.store_timeout_ms;
        match tokio::time::timeout(Duration::from_millis(timeout_ms), call).await {
            Ok(result) => result,
            Err(_) => Err(CodingError::Timeout { timeout_ms }),
        }
    }

    /// Read-modify-write one record with bounded conflict retries.
    ///
    /// The mutation closure runs against a private copy; a validation
    /// failure aborts before anything reaches the store, and a conflicted
    /// commit re-reads the record so the mutation re-validates against the
    /// new state.
    async fn mutate<F>(&self, id: RecordId, mutation: F) -> Result<CodingRecord, CodingError>
    where
        F: Fn(&mut CodingRecord, DateTime<Utc>) -> Result<(), CodingError> + Send + Sync,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let VersionedRecord {
                version,
                mut record,
            } = self.timed(self.store.fetch(&id)).await?;
            let now = self.time.now();
            mutation(&mut record, now)?;

            match self.timed(self.store.update(version, record)).await {
                Ok(updated) => return Ok(updated),
                Err(CodingError::ConcurrentModification { .. })
                    if attempt < self.config.max_update_attempts =>
                {
                    warn!(record_id = %id, attempt, "commit conflicted, retrying");
                    let backoff = self.config.retry_backoff_ms * u64::from(attempt);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(err) => {
                    if matches!(err, CodingError::ConcurrentModification { .. }) {
                        warn!(
                            record_id = %id,
                            attempts = attempt,
                            "conflict retries exhausted"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}

#[async_trait]
impl<S, A, B, T> CodingWorkflowApi for CodingWorkflowService<S, A, B, T>
where
    S: RecordStore,
    A: SequenceAllocator,
    B: BillingGateway,
    T: TimeSource,
{
    async fn create_record(
        &self,
        new: NewCodingRecord,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError> {
        invariants::invariant_non_empty(&new.patient.0, "patient reference")?;
        invariants::invariant_non_empty(&new.encounter.0, "encounter reference")?;
        invariants::invariant_non_empty(
            new.finalizing_clinician.as_str(),
            "finalizing clinician",
        )?;

        let attempts = self.config.max_allocation_attempts;
        for attempt in 1..=attempts {
            let now = self.time.now();
            let day = now.date_naive();
            let sequence = self.timed(self.allocator.next_for_day(day)).await?;
            let number = CodingNumber::format(day, sequence);
            let record = CodingRecord::new(new.clone(), number.clone(), actor.clone(), now);

            match self.timed(self.store.insert(record.clone())).await {
                Ok(_) => {
                    info!(
                        number = %number,
                        encounter = %record.encounter,
                        kind = %record.encounter_kind,
                        "coding record created"
                    );
                    return Ok(record);
                }
                Err(CodingError::DuplicateNumber { .. }) => {
                    warn!(number = %number, attempt, "coding number taken, reallocating");
                }
                Err(err) => return Err(err),
            }
        }

        warn!(attempts, "coding number allocation exhausted");
        Err(CodingError::AllocationExhausted { attempts })
    }

    async fn assign_code(
        &self,
        id: RecordId,
        item: NewAssignedCode,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError> {
        let updated = self
            .mutate(id, move |record, now| {
                ledger::add_assigned_code(record, item.clone(), &actor, now).map(|_| ())
            })
            .await?;
        debug!(record = %updated.coding_number, total = %updated.total_amount(), "code assigned");
        Ok(updated)
    }

    async fn remove_code(
        &self,
        id: RecordId,
        line_id: Uuid,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError> {
        let updated = self
            .mutate(id, move |record, now| {
                ledger::remove_assigned_code(record, line_id, &actor, now).map(|_| ())
            })
            .await?;
        debug!(record = %updated.coding_number, %line_id, "code removed");
        Ok(updated)
    }

    async fn add_diagnosis(
        &self,
        id: RecordId,
        diagnosis: DiagnosisCode,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError> {
        self.mutate(id, move |record, now| {
            ledger::add_diagnosis(record, diagnosis.clone(), &actor, now)
        })
        .await
    }

    async fn remove_diagnosis(
        &self,
        id: RecordId,
        code: &str,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError> {
        let code = code.to_string();
        self.mutate(id, move |record, now| {
            ledger::remove_diagnosis(record, &code, &actor, now).map(|_| ())
        })
        .await
    }

    async fn set_primary_diagnosis(
        &self,
        id: RecordId,
        code: &str,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError> {
        let code = code.to_string();
        self.mutate(id, move |record, now| {
            ledger::set_primary_diagnosis(record, &code, &actor, now)
        })
        .await
    }

    async fn raise_query(
        &self,
        id: RecordId,
        text: &str,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError> {
        let text = text.to_string();
        let updated = self
            .mutate(id, move |record, now| {
                queries::raise_query(record, &text, &actor, now).map(|_| ())
            })
            .await?;
        info!(record = %updated.coding_number, status = %updated.status, "query raised");
        Ok(updated)
    }

    async fn answer_query(
        &self,
        id: RecordId,
        query_id: Uuid,
        response: &str,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError> {
        let response = response.to_string();
        let updated = self
            .mutate(id, move |record, now| {
                queries::answer_query(record, query_id, &response, &actor, now)
            })
            .await?;
        info!(record = %updated.coding_number, %query_id, "query answered");
        Ok(updated)
    }

    async fn close_query(
        &self,
        id: RecordId,
        query_id: Uuid,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError> {
        self.mutate(id, move |record, now| {
            queries::close_query(record, query_id, &actor, now)
        })
        .await
    }

    async fn transition(
        &self,
        id: RecordId,
        action: TransitionAction,
        actor: ActorId,
        note: Option<String>,
    ) -> Result<CodingRecord, CodingError> {
        match action {
            TransitionAction::AssignCodes
            | TransitionAction::RaiseQuery
            | TransitionAction::AnswerQuery => Err(CodingError::validation(format!(
                "{action} carries a payload; use its dedicated operation"
            ))),
            TransitionAction::SyncBill => self.sync_billing(id, actor).await,
            _ => {
                let log_actor = actor.clone();
                let updated = self
                    .mutate(id, move |record, now| {
                        record
                            .apply_transition(action, &actor, now, note.clone())
                            .map(|_| ())
                    })
                    .await?;
                info!(
                    record = %updated.coding_number,
                    %action,
                    status = %updated.status,
                    actor = %log_actor,
                    "transition applied"
                );
                Ok(updated)
            }
        }
    }

    async fn sync_billing(
        &self,
        id: RecordId,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError> {
        let VersionedRecord { record, .. } = self.timed(self.store.fetch(&id)).await?;

        if record.linked_bill.is_some() {
            debug!(record = %record.coding_number, "bill already linked, sync is a no-op");
            return Ok(record);
        }
        if record.status != CodingStatus::Submitted {
            return Err(CodingError::InvalidTransition {
                from: record.status,
                action: TransitionAction::SyncBill,
            });
        }

        // External call first; the gateway is idempotent, so a conflicted
        // commit below can safely re-run against the same bill.
        let bill = self.timed(self.billing.sync_to_billing(&record)).await?;

        let commit_bill = bill.clone();
        let updated = self
            .mutate(id, move |record, now| {
                if record.linked_bill.is_some() {
                    // Another process finished the sync while we were at
                    // the gateway.
                    return Ok(());
                }
                record.linked_bill = Some(commit_bill.clone());
                record.bill_synced_at = Some(now);
                record.append_audit(
                    AuditDetails::BillLinked {
                        bill: commit_bill.clone(),
                    },
                    &actor,
                    now,
                    None,
                    None,
                );
                record
                    .apply_transition(TransitionAction::SyncBill, &actor, now, None)
                    .map(|_| ())
            })
            .await?;
        info!(record = %updated.coding_number, bill = %bill, "billing sync complete");
        Ok(updated)
    }

    async fn sweep_submitted(
        &self,
        actor: ActorId,
    ) -> Result<Vec<(RecordId, BillRef)>, CodingError> {
        // Enumerate first so the pagination window is not disturbed by
        // records leaving `submitted` as they sync.
        let mut pending = Vec::new();
        let mut offset = 0;
        let limit = 100;
        loop {
            let batch = self
                .timed(
                    self.store
                        .list_by_status(CodingStatus::Submitted, Page { offset, limit }),
                )
                .await?;
            let count = batch.len();
            pending.extend(batch.into_iter().map(|r| (r.id, r.coding_number)));
            if count < limit {
                break;
            }
            offset += limit;
        }

        let mut linked = Vec::new();
        for (id, number) in pending {
            match self.sync_billing(id, actor.clone()).await {
                Ok(updated) => {
                    if let Some(bill) = updated.linked_bill.clone() {
                        linked.push((updated.id, bill));
                    }
                }
                Err(CodingError::BillingUnavailable { reason }) => {
                    warn!(record = %number, %reason, "billing still unavailable, left in queue");
                }
                Err(err) => return Err(err),
            }
        }
        info!(linked = linked.len(), "billing sweep complete");
        Ok(linked)
    }

    async fn add_audit_note(
        &self,
        id: RecordId,
        message: &str,
        actor: ActorId,
    ) -> Result<CodingRecord, CodingError> {
        let message = message.to_string();
        self.mutate(id, move |record, now| {
            invariants::invariant_non_empty(&message, "audit note")?;
            record.append_audit(
                AuditDetails::Note {
                    message: message.trim().to_string(),
                },
                &actor,
                now,
                None,
                None,
            );
            Ok(())
        })
        .await
    }

    async fn get_record(&self, id: RecordId) -> Result<CodingRecord, CodingError> {
        let VersionedRecord { record, .. } = self.timed(self.store.fetch(&id)).await?;
        Ok(record)
    }

    async fn list_queue(
        &self,
        status: CodingStatus,
        page: Page,
    ) -> Result<Vec<CodingRecord>, CodingError> {
        let records = self.timed(self.store.list_by_status(status, page)).await?;
        debug!(%status, count = records.len(), "queue listed");
        Ok(records)
    }

    async fn list_by_coder(&self, coder: &ActorId) -> Result<Vec<CodingRecord>, CodingError> {
        self.timed(self.store.list_by_coder(coder)).await
    }
}
