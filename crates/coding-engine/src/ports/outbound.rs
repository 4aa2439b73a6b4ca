//! # Outbound Ports
//!
//! Traits for the engine's external dependencies: the record store, the
//! day-sequence allocator, the billing subsystem and the time source.
//! Adapters implement these; the service only sees the traits.

use crate::domain::{CodingError, CodingRecord, CodingStatus};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared_types::{ActorId, BillRef, RecordId};

/// A record together with its optimistic-concurrency token.
#[derive(Clone, Debug)]
pub struct VersionedRecord {
    /// Store version, bumped on every successful update.
    pub version: u64,
    /// The record as of that version.
    pub record: CodingRecord,
}

/// Pagination window for queue views.
#[derive(Clone, Copy, Debug)]
pub struct Page {
    /// Records to skip.
    pub offset: usize,
    /// Maximum records to return.
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// Durable persistence of coding records - outbound port.
///
/// `insert` enforces both uniqueness constraints; `update` is
/// compare-and-swap on the record version, so a read-modify-write commits
/// all of its changes (field updates plus audit append) or none of them.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new record.
    ///
    /// Fails with `DuplicateEncounter` when `(encounter, encounter_kind)`
    /// already has a record, or `DuplicateNumber` when the coding number
    /// collides.
    async fn insert(&self, record: CodingRecord) -> Result<RecordId, CodingError>;

    /// Fetch a record with its version token.
    async fn fetch(&self, id: &RecordId) -> Result<VersionedRecord, CodingError>;

    /// Install a new version of a record.
    ///
    /// Fails with `ConcurrentModification` when the stored version no
    /// longer matches `expected_version`; the caller re-reads and retries.
    async fn update(
        &self,
        expected_version: u64,
        record: CodingRecord,
    ) -> Result<CodingRecord, CodingError>;

    /// Records in a status, in stable coding-number order.
    async fn list_by_status(
        &self,
        status: CodingStatus,
        page: Page,
    ) -> Result<Vec<CodingRecord>, CodingError>;

    /// A coder's records still on an active queue.
    async fn list_by_coder(&self, coder: &ActorId) -> Result<Vec<CodingRecord>, CodingError>;
}

/// Day-scoped sequence allocator - outbound port.
///
/// The one cross-record shared resource: its increment must be indivisible
/// so two concurrent creations on the same day never see the same value.
#[async_trait]
pub trait SequenceAllocator: Send + Sync {
    /// Atomically increment and return the day's sequence counter.
    async fn next_for_day(&self, day: NaiveDate) -> Result<u32, CodingError>;
}

/// Billing subsystem handoff - outbound port.
#[async_trait]
pub trait BillingGateway: Send + Sync {
    /// Create (or return the existing) bill for an approved record.
    ///
    /// Idempotent: called twice for the same record it returns the same
    /// reference without side effects.
    async fn sync_to_billing(&self, record: &CodingRecord) -> Result<BillRef, CodingError>;
}

/// Clock abstraction so domain timestamps are injectable in tests.
pub trait TimeSource: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock billing gateway for tests: fixed reference, optional failure.
#[derive(Clone, Debug, Default)]
pub struct MockBillingGateway {
    /// Reference returned on success; defaults to `BILL-TEST-1`.
    pub bill_ref: Option<BillRef>,
    /// Fail every call with `BillingUnavailable`?
    pub should_fail: bool,
}

impl MockBillingGateway {
    /// Gateway that always returns `bill_ref`.
    pub fn returning(bill_ref: impl Into<String>) -> Self {
        Self {
            bill_ref: Some(BillRef::new(bill_ref)),
            should_fail: false,
        }
    }

    /// Gateway that always fails with `BillingUnavailable`.
    pub fn unavailable() -> Self {
        Self {
            bill_ref: None,
            should_fail: true,
        }
    }
}

#[async_trait]
impl BillingGateway for MockBillingGateway {
    async fn sync_to_billing(&self, record: &CodingRecord) -> Result<BillRef, CodingError> {
        if self.should_fail {
            return Err(CodingError::BillingUnavailable {
                reason: "mock gateway offline".to_string(),
            });
        }
        if let Some(existing) = &record.linked_bill {
            return Ok(existing.clone());
        }
        Ok(self
            .bill_ref
            .clone()
            .unwrap_or_else(|| BillRef::new("BILL-TEST-1")))
    }
}
