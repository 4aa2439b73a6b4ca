//! # Identity Types
//!
//! Newtypes for the identities that cross subsystem boundaries.
//!
//! ## Clusters
//!
//! - **Actors**: `ActorId` — an already-authenticated user identity supplied
//!   by the auth layer; subsystems only record who acted.
//! - **Clinical references**: `PatientRef`, `EncounterRef`, `EncounterKind`.
//! - **Storage & billing**: `RecordId`, `BillRef`.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// An authenticated actor identity (coder, reviewer, clinician, clerk).
///
/// Authentication happens outside the core subsystems; by the time an
/// `ActorId` reaches a service it is already trusted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    /// Wrap a raw identity string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a patient document in the patient registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatientRef(pub String);

impl PatientRef {
    /// Wrap a raw patient reference.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PatientRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a clinical encounter document.
///
/// Only meaningful together with an [`EncounterKind`]; the pair is unique
/// per encounter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncounterRef(pub String);

impl EncounterRef {
    /// Wrap a raw encounter reference.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for EncounterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kind of clinical encounter a record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterKind {
    /// Outpatient department appointment.
    OpdAppointment,
    /// Inpatient admission.
    Admission,
    /// Emergency department visit.
    EmergencyVisit,
}

impl fmt::Display for EncounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EncounterKind::OpdAppointment => "opd_appointment",
            EncounterKind::Admission => "admission",
            EncounterKind::EmergencyVisit => "emergency_visit",
        };
        f.write_str(s)
    }
}

/// Opaque storage key of a document, assigned by the store at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Generate a fresh storage key.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Reference to a bill document in the billing subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillRef(pub String);

impl BillRef {
    /// Wrap a raw bill reference.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for BillRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
