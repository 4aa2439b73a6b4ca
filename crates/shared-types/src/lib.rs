//! # Shared Types Crate
//!
//! Identity and money primitives shared across hospital subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: types that cross a subsystem boundary
//!   (coding → billing, records → coding) are defined here, nowhere else.
//! - **Opaque Identity**: actor and reference identifiers are newtypes over
//!   their storage representation; subsystems never parse them.
//! - **Exact Money**: financial amounts are `rust_decimal::Decimal`; floats
//!   never carry money.

pub mod identity;

pub use identity::{ActorId, BillRef, EncounterKind, EncounterRef, PatientRef, RecordId};

/// Exact decimal money amount, currency-agnostic.
pub type Money = rust_decimal::Decimal;
