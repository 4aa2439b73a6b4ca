//! Cross-component integration tests for the coding engine.

pub mod lifecycle;
pub mod replay;

use coding_engine::adapters::{InMemoryBillingGateway, InMemoryRecordStore, SystemTimeSource};
use coding_engine::{CodingWorkflowService, MockBillingGateway, WorkflowConfig};
use shared_types::{ActorId, EncounterKind, EncounterRef, PatientRef};

/// Service wired entirely with in-memory adapters.
pub type InMemoryService = CodingWorkflowService<
    InMemoryRecordStore,
    InMemoryRecordStore,
    InMemoryBillingGateway,
    SystemTimeSource,
>;

/// Service whose billing gateway is the fixed-reference mock.
pub type MockBilledService = CodingWorkflowService<
    InMemoryRecordStore,
    InMemoryRecordStore,
    MockBillingGateway,
    SystemTimeSource,
>;

/// Build a service plus handles to its store and billing gateway.
pub fn in_memory_service() -> (InMemoryService, InMemoryRecordStore, InMemoryBillingGateway) {
    let store = InMemoryRecordStore::new();
    let billing = InMemoryBillingGateway::new();
    let service = CodingWorkflowService::new(
        store.clone(),
        store.clone(),
        billing.clone(),
        SystemTimeSource,
        WorkflowConfig::default(),
    )
    .expect("default config is valid");
    (service, store, billing)
}

/// Build a service whose billing sync always yields `bill_ref`.
pub fn mock_billed_service(bill_ref: &str) -> (MockBilledService, InMemoryRecordStore) {
    let store = InMemoryRecordStore::new();
    let service = CodingWorkflowService::new(
        store.clone(),
        store.clone(),
        MockBillingGateway::returning(bill_ref),
        SystemTimeSource,
        WorkflowConfig::default(),
    )
    .expect("default config is valid");
    (service, store)
}

/// Creation parameters for an encounter.
pub fn encounter(reference: &str, kind: EncounterKind) -> coding_engine::NewCodingRecord {
    coding_engine::NewCodingRecord {
        patient: PatientRef::new("P-1001"),
        encounter: EncounterRef::new(reference),
        encounter_kind: kind,
        finalizing_clinician: ActorId::new("dr-finalizer"),
    }
}
