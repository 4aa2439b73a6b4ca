//! # In-Memory Record Store
//!
//! Reference implementation of [`RecordStore`] and [`SequenceAllocator`]
//! backed by process memory. Used by the test suites and as the template
//! for a document-store adapter: the uniqueness indexes and the versioned
//! compare-and-swap mirror what the production store must provide.

use crate::domain::{CodingError, CodingNumber, CodingRecord, CodingStatus};
use crate::ports::outbound::{Page, RecordStore, SequenceAllocator, VersionedRecord};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use shared_types::{ActorId, EncounterKind, EncounterRef, RecordId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Tables {
    records: HashMap<RecordId, VersionedRecord>,
    by_encounter: HashMap<(EncounterRef, EncounterKind), RecordId>,
    numbers: HashSet<CodingNumber>,
}

#[derive(Default)]
struct Inner {
    /// All indexes live under one lock so an insert checks and installs
    /// its uniqueness constraints indivisibly.
    state: RwLock<Tables>,
    /// Per-day sequence counters, independent of any record lock.
    day_counters: Mutex<HashMap<NaiveDate, u32>>,
    /// Test hook: force the next N updates to conflict.
    injected_conflicts: AtomicU32,
}

/// In-memory record store with versioned compare-and-swap semantics.
///
/// Cheaply cloneable; clones share state, so one instance can serve as both
/// the service's [`RecordStore`] and its [`SequenceAllocator`].
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    inner: Arc<Inner>,
}

impl InMemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.inner.state.read().records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Test hook: make the next `n` update calls fail with
    /// `ConcurrentModification`, as a contended store would.
    pub fn fail_next_updates(&self, n: u32) {
        self.inner.injected_conflicts.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, record: CodingRecord) -> Result<RecordId, CodingError> {
        let mut state = self.inner.state.write();

        let encounter_key = (record.encounter.clone(), record.encounter_kind);
        if state.by_encounter.contains_key(&encounter_key) {
            return Err(CodingError::DuplicateEncounter {
                encounter: record.encounter.clone(),
                kind: record.encounter_kind,
            });
        }
        if state.numbers.contains(&record.coding_number) {
            return Err(CodingError::DuplicateNumber {
                number: record.coding_number.clone(),
            });
        }

        let id = record.id;
        state.numbers.insert(record.coding_number.clone());
        state.by_encounter.insert(encounter_key, id);
        state.records.insert(id, VersionedRecord { version: 1, record });
        Ok(id)
    }

    async fn fetch(&self, id: &RecordId) -> Result<VersionedRecord, CodingError> {
        self.inner
            .state
            .read()
            .records
            .get(id)
            .cloned()
            .ok_or(CodingError::RecordNotFound { id: *id })
    }

    async fn update(
        &self,
        expected_version: u64,
        record: CodingRecord,
    ) -> Result<CodingRecord, CodingError> {
        let injected = &self.inner.injected_conflicts;
        if injected.load(Ordering::SeqCst) > 0 {
            injected.fetch_sub(1, Ordering::SeqCst);
            return Err(CodingError::ConcurrentModification { id: record.id });
        }

        let mut state = self.inner.state.write();
        let id = record.id;
        let slot = state
            .records
            .get_mut(&id)
            .ok_or(CodingError::RecordNotFound { id })?;
        if slot.version != expected_version {
            return Err(CodingError::ConcurrentModification { id });
        }
        slot.version += 1;
        slot.record = record.clone();
        Ok(record)
    }

    async fn list_by_status(
        &self,
        status: CodingStatus,
        page: Page,
    ) -> Result<Vec<CodingRecord>, CodingError> {
        let state = self.inner.state.read();
        let mut matching: Vec<&CodingRecord> = state
            .records
            .values()
            .map(|v| &v.record)
            .filter(|r| r.status == status)
            .collect();
        matching.sort_by(|a, b| a.coding_number.as_str().cmp(b.coding_number.as_str()));
        Ok(matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect())
    }

    async fn list_by_coder(&self, coder: &ActorId) -> Result<Vec<CodingRecord>, CodingError> {
        let state = self.inner.state.read();
        let mut matching: Vec<&CodingRecord> = state
            .records
            .values()
            .map(|v| &v.record)
            .filter(|r| r.coded_by.as_ref() == Some(coder) && r.status.is_active_work())
            .collect();
        matching.sort_by(|a, b| a.coding_number.as_str().cmp(b.coding_number.as_str()));
        Ok(matching.into_iter().cloned().collect())
    }
}

#[async_trait]
impl SequenceAllocator for InMemoryRecordStore {
    async fn next_for_day(&self, day: NaiveDate) -> Result<u32, CodingError> {
        let mut counters = self.inner.day_counters.lock();
        let counter = counters.entry(day).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}
