//! # Hospital Core Test Suite
//!
//! Unified test crate for cross-component flows of the coding engine.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── lifecycle.rs    # End-to-end workflow scenarios
//!     ├── concurrency.rs  # Allocation and commit races
//!     └── replay.rs       # Audit trail as source of truth
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p his-tests
//!
//! # By category
//! cargo test -p his-tests integration::lifecycle::
//! cargo test -p his-tests integration::concurrency::
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
