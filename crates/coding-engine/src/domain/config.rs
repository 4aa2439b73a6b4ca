//! # Workflow Configuration
//!
//! Tuning knobs for the application service. Constructed explicitly and
//! passed in; the engine never reads ambient global state.

use super::errors::CodingError;
use serde::{Deserialize, Serialize};

/// Retry and deadline configuration for the workflow service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Bounded optimistic-concurrency retries per operation.
    pub max_update_attempts: u32,
    /// Base backoff between conflict retries, multiplied by the attempt
    /// number.
    pub retry_backoff_ms: u64,
    /// Deadline for a single store call; elapse surfaces `Timeout` instead
    /// of hanging.
    pub store_timeout_ms: u64,
    /// Bounded coding-number allocation attempts per creation.
    pub max_allocation_attempts: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_update_attempts: 3,
            retry_backoff_ms: 25,
            store_timeout_ms: 5_000,
            max_allocation_attempts: 5,
        }
    }
}

impl WorkflowConfig {
    /// Reject configurations that would disable the engine's bounded-retry
    /// guarantees.
    pub fn validate(&self) -> Result<(), CodingError> {
        if self.max_update_attempts == 0 {
            return Err(CodingError::validation(
                "max_update_attempts must be at least 1",
            ));
        }
        if self.max_allocation_attempts == 0 {
            return Err(CodingError::validation(
                "max_allocation_attempts must be at least 1",
            ));
        }
        if self.store_timeout_ms == 0 {
            return Err(CodingError::validation("store_timeout_ms must be non-zero"));
        }
        Ok(())
    }
}
